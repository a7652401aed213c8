//! Router chain orchestration.
//!
//! One classification call maps a free-form query onto a fixed closed set of
//! categories, then exactly one downstream expert call answers it with a
//! category-specific system instruction. Unclassifiable queries take a
//! fallback path instead of an expert call.

use crate::chains::RunOutcome;
use crate::provider::TextProvider;
use crate::state::{ChainStep, ProgressFeed, StrategyId};
use futures_util::StreamExt;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info};

/// Category a query can route to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    /// History expert.
    History,
    /// Math expert.
    Math,
    /// Science expert.
    Science,
    /// No category matched; the fallback path is taken.
    Unknown,
}

/// Fixed checking order. When a response contains several category labels,
/// the earliest entry here wins.
const ROUTING_ORDER: [Category; 3] = [Category::History, Category::Math, Category::Science];

impl Category {
    /// Lowercase label used in matching and system instructions.
    pub fn label(&self) -> &'static str {
        match self {
            Self::History => "history",
            Self::Math => "math",
            Self::Science => "science",
            Self::Unknown => "unknown",
        }
    }

    /// Capitalized label used in step titles.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::History => "History",
            Self::Math => "Math",
            Self::Science => "Science",
            Self::Unknown => "Unknown",
        }
    }

    /// Classify a raw classifier response by case-insensitive substring
    /// containment, in the fixed checking order.
    pub fn from_response(response: &str) -> Self {
        let needle = response.trim().to_lowercase();
        for category in ROUTING_ORDER {
            if needle.contains(category.label()) {
                return category;
            }
        }
        Self::Unknown
    }
}

/// Orchestrator for the router chain.
pub struct RouterChain {
    provider: Arc<dyn TextProvider>,
    feed: ProgressFeed<ChainStep>,
}

impl RouterChain {
    /// Create a router chain orchestrator.
    pub fn new(provider: Arc<dyn TextProvider>) -> Self {
        Self {
            provider,
            feed: ProgressFeed::new(),
        }
    }

    /// Subscribe to live step updates.
    pub fn subscribe(&self) -> watch::Receiver<Vec<ChainStep>> {
        self.feed.subscribe()
    }

    /// Run the chain: route, then answer (or fall back).
    pub async fn run(&self, query: &str) -> RunOutcome {
        let run_id = StrategyId::Router.new_run_id();
        info!(run_id = %run_id, "router chain started");

        self.feed.replace(vec![
            ChainStep::pending("Step 1: Route Query"),
            ChainStep::pending("Step 2: Expert Answer"),
        ]);

        // Routing call
        let routing_prompt = format!(
            "Categorize the following query. Respond with only one word: 'history', 'math', or 'science'. Query: {}",
            query
        );
        self.feed.update(|records| records[0].begin(routing_prompt.clone()));

        let mut fragments = self.provider.stream(&routing_prompt, None).await;
        let mut response = String::new();
        while let Some(fragment) = fragments.next().await {
            response.push_str(&fragment);
            self.feed.update(|records| records[0].append(&fragment));
        }

        let category = Category::from_response(&response);
        debug!(category = category.label(), "query routed");

        // The routing step's raw output is replaced with the routing verdict
        // once classification settles.
        self.feed.update(|records| {
            records[0].output = format!("Routing to: {} expert", category.label().to_uppercase());
            records[0].finish();
            records[1].title = format!("Step 2: {} Expert Answer", category.display_name());
        });

        // Expert (or fallback) call
        let (expert_prompt, system_instruction) = if category == Category::Unknown {
            (
                "Acknowledge that you can't determine if the user's query is about history, math, or science, and ask them to rephrase."
                    .to_string(),
                None,
            )
        } else {
            (
                format!("Answer the following query: {}", query),
                Some(format!(
                    "You are a world-class expert in {}. Provide a clear, concise, and accurate answer.",
                    category.label()
                )),
            )
        };

        self.feed.update(|records| records[1].begin(expert_prompt.clone()));

        let mut fragments = self
            .provider
            .stream(&expert_prompt, system_instruction.as_deref())
            .await;
        while let Some(fragment) = fragments.next().await {
            self.feed.update(|records| records[1].append(&fragment));
        }
        self.feed.update(|records| records[1].finish());

        info!(run_id = %run_id, "router chain finished");
        RunOutcome {
            run_id,
            steps: self.feed.snapshot(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_by_substring_containment() {
        assert_eq!(Category::from_response("science"), Category::Science);
        assert_eq!(Category::from_response("  Math.\n"), Category::Math);
        assert_eq!(
            Category::from_response("The query is about HISTORY"),
            Category::History
        );
    }

    #[test]
    fn tie_break_follows_the_fixed_checking_order() {
        // Both labels present: the earlier-checked one wins.
        assert_eq!(
            Category::from_response("could be math or history"),
            Category::History
        );
        assert_eq!(
            Category::from_response("science, though arguably math"),
            Category::Math
        );
    }

    #[test]
    fn unmatched_responses_resolve_to_unknown() {
        assert_eq!(Category::from_response("geography"), Category::Unknown);
        assert_eq!(Category::from_response(""), Category::Unknown);
    }
}
