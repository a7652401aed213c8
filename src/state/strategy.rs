//! Strategy identifiers and run identity.

use uuid::Uuid;

/// Identifier of a chaining strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StrategyId {
    /// Two-step chain, output of the first call feeding the second.
    Simple,
    /// Fixed-length ordered pipeline of dependent calls.
    Sequential,
    /// Classification call dispatching to one expert call.
    Router,
    /// Reason/act/observe loop over mock tools plus one synthesis call.
    AgentExecutor,
    /// Concurrent per-chunk calls joined into one reduce call.
    MapReduce,
    /// Act, evaluate, reflect, retry - exactly one retry.
    Reflexion,
    /// Planning call parsed into sequential tool invocations.
    PlannerExecutor,
    /// Concurrent candidate generation, scoring, and selection.
    TreeOfThoughts,
    /// User-authored step list with placeholder substitution.
    Custom,
}

impl StrategyId {
    /// Stable label used in run identifiers.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Simple => "simple",
            Self::Sequential => "sequential",
            Self::Router => "router",
            Self::AgentExecutor => "agent_executor",
            Self::MapReduce => "map_reduce",
            Self::Reflexion => "reflexion",
            Self::PlannerExecutor => "planner_executor",
            Self::TreeOfThoughts => "tree_of_thoughts",
            Self::Custom => "custom",
        }
    }

    /// Mint a fresh run identifier for this strategy.
    pub fn new_run_id(&self) -> String {
        format!("{}-{}", self.label(), Uuid::new_v4())
    }
}

impl std::fmt::Display for StrategyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}
