//! Reflexion orchestration: attempt, critique, reflect, retry.
//!
//! A fixed four-step loop with exactly one retry: the provider produces a
//! first attempt, critiques it, distills the critique into a reflection,
//! and rewrites the attempt with the reflection applied. Each step feeds
//! on the output of the one before it.

use super::RunOutcome;
use crate::provider::TextProvider;
use crate::state::{ChainStep, ProgressFeed, StrategyId};
use futures_util::StreamExt;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;

/// Orchestrator for the reflexion strategy.
pub struct ReflexionChain {
    provider: Arc<dyn TextProvider>,
    feed: ProgressFeed<ChainStep>,
}

impl ReflexionChain {
    /// Create a reflexion chain over the given provider.
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

    /// Run one attempt-critique-reflect-retry cycle for `task`.
    pub async fn run(&self, task: &str) -> RunOutcome {
        let run_id = StrategyId::Reflexion.new_run_id();
        info!(run_id = %run_id, "reflexion run started");

        let titles = [
            "Step 1: First Attempt",
            "Step 2: Evaluate",
            "Step 3: Reflect",
            "Step 4: Revised Attempt",
        ];
        self.feed
            .replace(titles.iter().map(|t| ChainStep::pending(*t)).collect());

        let mut previous = String::new();
        for (index, _) in titles.iter().enumerate() {
            let prompt = match index {
                0 => format!("Complete the following task:\n\n{}", task),
                1 => format!(
                    "You are a strict reviewer. Critique the following response to the task \"{}\". Point out weaknesses, factual errors, and omissions.\n\nResponse:\n\"\"\"\n{}\n\"\"\"",
                    task, previous
                ),
                2 => format!(
                    "You received the critique below of your earlier response. Reflect on it and list the concrete improvements you will make.\n\nCritique:\n\"\"\"\n{}\n\"\"\"",
                    previous
                ),
                _ => format!(
                    "Rewrite your response to the task \"{}\". Apply the improvements from your reflection. Respond with the improved version only.\n\nReflection:\n\"\"\"\n{}\n\"\"\"",
                    task, previous
                ),
            };

            self.feed.update(|steps| steps[index].begin(&prompt));
            let mut fragments = self.provider.stream(&prompt, None).await;
            while let Some(fragment) = fragments.next().await {
                self.feed.update(|steps| steps[index].append(&fragment));
            }
            self.feed.update(|steps| steps[index].finish());
            previous = self.feed.snapshot()[index].output.clone();
        }

        info!(run_id = %run_id, "reflexion run finished");
        RunOutcome {
            run_id,
            steps: self.feed.snapshot(),
        }
    }
}
