//! Chain orchestrators - one module per composition strategy.
//!
//! Every orchestrator shares the same shape: resolve inputs, invoke the
//! streaming backend, fold fragments into observable step records, advance
//! or terminate. They are independent algorithms; the only things they share
//! are the step state model and the [`TextProvider`](crate::provider)
//! contract.
//!
//! Failure policy, uniform across strategies: a backend call that yields an
//! error fragment is ordinary output, a tool that rejects its input returns
//! a descriptive observation, and a parse failure degrades to a placeholder
//! value. No single failure aborts a run; every run terminates.
//!
//! | Strategy | Control flow |
//! |---|---|
//! | [`sequential`] | fixed ordered steps, each fed the previous output |
//! | [`router`] | classify, then exactly one expert call (or a fallback) |
//! | [`agent`] | heuristic tool triggers, then one synthesis call |
//! | [`map_reduce`] | concurrent per-chunk calls, barrier, one reduce call |
//! | [`reflexion`] | act, evaluate, reflect, one revised attempt |
//! | [`planner`] | plan call, parsed steps run a tool, one synthesis call |
//! | [`tree_of_thoughts`] | N candidates scored concurrently, best continues |
//! | [`custom`] | user-authored steps with `{{output_N}}` substitution |

pub mod agent;
pub mod custom;
pub mod map_reduce;
pub mod planner;
pub mod reflexion;
pub mod router;
pub mod sequential;
pub mod tree_of_thoughts;

pub use agent::{AgentExecutor, AgentOutcome};
pub use custom::{CustomChain, CustomStepSpec};
pub use map_reduce::{MapReduceChain, MapReduceOutcome, MapStep, ReduceStep};
pub use planner::{ExecutionStep, FinalAnswerStep, PlanStep, PlannerExecutor, PlannerOutcome};
pub use reflexion::ReflexionChain;
pub use router::{Category, RouterChain};
pub use sequential::{marketing_steps, story_steps, SequentialChain, SequentialStep};
pub use tree_of_thoughts::{FinalAnswer, TreeOfThoughts, TreeOfThoughtsOutcome};

use crate::state::ChainStep;

/// Final record of one chain run over [`ChainStep`]s.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    /// Run identifier, usable as a feedback key.
    pub run_id: String,
    /// Final state of the run's step records.
    pub steps: Vec<ChainStep>,
}
