//! User-defined sequential chains with output placeholders.
//!
//! Steps run strictly in order. A step's template may reference any earlier
//! step's output with a `{{output_N}}` placeholder (1-indexed); placeholders
//! are resolved at dispatch time, and a reference to a step that has not run
//! yet resolves to an inline error marker rather than failing the run.

use super::RunOutcome;
use crate::provider::TextProvider;
use crate::state::{ChainStep, ProgressFeed, StrategyId};
use futures_util::StreamExt;
use regex::Regex;
use std::sync::Arc;
use std::sync::OnceLock;
use tokio::sync::watch;
use tracing::info;

fn placeholder_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{\{output_(\d+)\}\}").expect("valid regex"))
}

/// Replace `{{output_N}}` placeholders with earlier step outputs.
///
/// `outputs` holds the outputs of the steps that already ran, in order.
/// Out-of-range references resolve to an inline error marker.
pub fn resolve_template(template: &str, outputs: &[String]) -> String {
    placeholder_re()
        .replace_all(template, |caps: &regex::Captures<'_>| {
            let n: usize = caps[1].parse().unwrap_or(0);
            if n >= 1 && n <= outputs.len() {
                outputs[n - 1].clone()
            } else {
                format!("[Error: Output of step {} not found]", &caps[1])
            }
        })
        .into_owned()
}

/// Definition of one user-authored step.
#[derive(Debug, Clone)]
pub struct CustomStepSpec {
    /// Display title. An empty title defaults to "Step N" at run time.
    pub title: String,
    /// Prompt template with optional `{{output_N}}` placeholders.
    pub template: String,
}

impl CustomStepSpec {
    /// Create a step definition.
    pub fn new(title: impl Into<String>, template: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            template: template.into(),
        }
    }
}

/// Orchestrator for user-defined chains.
pub struct CustomChain {
    provider: Arc<dyn TextProvider>,
    feed: ProgressFeed<ChainStep>,
}

impl CustomChain {
    /// Create a custom chain over the given provider.
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

    /// Run the user-defined steps in order.
    pub async fn run(&self, specs: Vec<CustomStepSpec>) -> RunOutcome {
        let run_id = StrategyId::Custom.new_run_id();
        info!(run_id = %run_id, steps = specs.len(), "custom run started");

        self.feed.replace(
            specs
                .iter()
                .enumerate()
                .map(|(index, spec)| {
                    let title = if spec.title.trim().is_empty() {
                        format!("Step {}", index + 1)
                    } else {
                        spec.title.clone()
                    };
                    ChainStep::pending(&title)
                })
                .collect(),
        );

        let mut outputs: Vec<String> = Vec::new();
        for (index, spec) in specs.iter().enumerate() {
            let prompt = resolve_template(&spec.template, &outputs);
            self.feed.update(|steps| steps[index].begin(&prompt));
            let mut fragments = self.provider.stream(&prompt, None).await;
            while let Some(fragment) = fragments.next().await {
                self.feed.update(|steps| steps[index].append(&fragment));
            }
            self.feed.update(|steps| steps[index].finish());
            outputs.push(self.feed.snapshot()[index].output.clone());
        }

        info!(run_id = %run_id, "custom run finished");
        RunOutcome {
            run_id,
            steps: self.feed.snapshot(),
        }
    }
}
