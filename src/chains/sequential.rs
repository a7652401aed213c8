//! Simple and sequential chain orchestration.
//!
//! Runs a fixed-length ordered list of steps, each step's prompt built from
//! the immediately preceding step's final output. Strictly sequential: a
//! step's stream runs to exhaustion before the next step's prompt resolves.
//! An error fragment in one step is carried forward as ordinary output; the
//! chain never aborts early.

use crate::chains::RunOutcome;
use crate::provider::TextProvider;
use crate::state::{ChainStep, Priority, ProgressFeed, StrategyId};
use futures_util::StreamExt;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info};

/// Specification of one sequential step.
///
/// The prompt builder receives the previous step's final output (`""` for
/// the first step, whose builder typically captures the user input instead).
pub struct SequentialStep {
    title: String,
    priority: Option<Priority>,
    prompt: Box<dyn Fn(&str) -> String + Send + Sync>,
}

impl SequentialStep {
    /// Create a step from a title and a prompt builder.
    pub fn new(
        title: impl Into<String>,
        prompt: impl Fn(&str) -> String + Send + Sync + 'static,
    ) -> Self {
        Self {
            title: title.into(),
            priority: None,
            prompt: Box::new(prompt),
        }
    }

    /// Attach an advisory priority tag.
    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Resolve the prompt against the previous step's final output.
    pub fn resolve(&self, previous_output: &str) -> String {
        (self.prompt)(previous_output)
    }
}

impl std::fmt::Debug for SequentialStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SequentialStep")
            .field("title", &self.title)
            .field("priority", &self.priority)
            .finish_non_exhaustive()
    }
}

/// Orchestrator for simple and sequential chains.
pub struct SequentialChain {
    provider: Arc<dyn TextProvider>,
    feed: ProgressFeed<ChainStep>,
    strategy: StrategyId,
}

impl SequentialChain {
    /// Create a sequential chain orchestrator.
    pub fn new(provider: Arc<dyn TextProvider>) -> Self {
        Self {
            provider,
            feed: ProgressFeed::new(),
            strategy: StrategyId::Sequential,
        }
    }

    /// Label runs with a different strategy id (the two-step simple chain
    /// uses the same engine under its own id).
    pub fn with_run_label(mut self, strategy: StrategyId) -> Self {
        self.strategy = strategy;
        self
    }

    /// Subscribe to live step updates.
    pub fn subscribe(&self) -> watch::Receiver<Vec<ChainStep>> {
        self.feed.subscribe()
    }

    /// Run the chain to completion.
    ///
    /// Replaces any previous run's records, then executes each step in
    /// order, feeding the previous step's final output into the next step's
    /// prompt builder.
    pub async fn run(&self, steps: Vec<SequentialStep>) -> RunOutcome {
        let run_id = self.strategy.new_run_id();
        info!(run_id = %run_id, steps = steps.len(), "sequential chain started");

        let initial: Vec<ChainStep> = steps
            .iter()
            .map(|spec| {
                let mut step = ChainStep::pending(&spec.title);
                step.priority = spec.priority;
                step
            })
            .collect();
        self.feed.replace(initial);

        let mut previous_output = String::new();
        for (index, spec) in steps.iter().enumerate() {
            let prompt = spec.resolve(&previous_output);
            debug!(step = index, "dispatching step");
            self.feed.update(|records| records[index].begin(prompt.clone()));

            let mut fragments = self.provider.stream(&prompt, None).await;
            let mut output = String::new();
            while let Some(fragment) = fragments.next().await {
                output.push_str(&fragment);
                self.feed.update(|records| records[index].append(&fragment));
            }

            self.feed.update(|records| records[index].finish());
            previous_output = output;
        }

        info!(run_id = %run_id, "sequential chain finished");
        RunOutcome {
            run_id,
            steps: self.feed.snapshot(),
        }
    }
}

/// Two-step story pipeline: title, then synopsis written from that title.
pub fn story_steps(topic: &str) -> Vec<SequentialStep> {
    let topic = topic.to_string();
    vec![
        SequentialStep::new("Step 1: Generate Title", move |_| {
            format!("Generate a creative title for a sci-fi story about {}.", topic)
        })
        .with_priority(Priority::High),
        SequentialStep::new("Step 2: Generate Synopsis", |title| {
            format!("Write a short story synopsis based on the title: \"{}\"", title)
        })
        .with_priority(Priority::Medium),
    ]
}

/// Three-step marketing pipeline: slogan, ad copy, French translation.
pub fn marketing_steps(product: &str) -> Vec<SequentialStep> {
    let product_for_slogan = product.to_string();
    let product_for_copy = product.to_string();
    vec![
        SequentialStep::new("Step 1: Generate Slogan", move |_| {
            format!("Create a catchy marketing slogan for {}.", product_for_slogan)
        })
        .with_priority(Priority::High),
        SequentialStep::new("Step 2: Generate Ad Copy", move |slogan| {
            format!(
                "Write a short, punchy ad copy for {} using the slogan: \"{}\"",
                product_for_copy, slogan
            )
        })
        .with_priority(Priority::Medium),
        SequentialStep::new("Step 3: Translate to French", |ad_copy| {
            format!("Translate the following ad copy to French: \"{}\"", ad_copy)
        })
        .with_priority(Priority::Low),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompts_use_only_the_previous_output() {
        let steps = marketing_steps("Quantum Quark Cola");
        assert_eq!(
            steps[0].resolve(""),
            "Create a catchy marketing slogan for Quantum Quark Cola."
        );
        assert_eq!(
            steps[1].resolve("Taste the quark!"),
            "Write a short, punchy ad copy for Quantum Quark Cola using the slogan: \"Taste the quark!\""
        );
        assert_eq!(
            steps[2].resolve("Drink it."),
            "Translate the following ad copy to French: \"Drink it.\""
        );
    }

    #[test]
    fn story_preset_carries_priorities() {
        let steps = story_steps("a haunted spaceship");
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0].priority, Some(Priority::High));
        assert_eq!(steps[1].priority, Some(Priority::Medium));
        assert!(steps[0].resolve("").contains("a haunted spaceship"));
    }

    #[test]
    fn resolution_is_deterministic() {
        let steps = story_steps("a lost robot");
        assert_eq!(steps[1].resolve("The Forgotten Circuit"), steps[1].resolve("The Forgotten Circuit"));
    }
}
