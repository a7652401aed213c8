//! Agent executor orchestration (ReAct-style).
//!
//! Not a general-purpose planner: fixed heuristics on the raw query decide
//! up front which tools fire. Each triggered tool contributes a
//! thought/action/observation triple, and a final synthesis call streams
//! the answer from the gathered observations. When both tools trigger, the
//! calculator's steps strictly precede the search's, regardless of where
//! each trigger appears in the query text.

use crate::provider::TextProvider;
use crate::state::{AgentStep, AgentStepKind, ProgressFeed, StrategyId};
use crate::tools::{Calculator, SearchTool, Tool};
use futures_util::StreamExt;
use regex::Regex;
use std::sync::Arc;
use std::sync::OnceLock;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info};

/// Pacing delay between appended log entries.
const STEP_DELAY: Duration = Duration::from_millis(250);

fn math_expression_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(\(?(?:\d+\s*[*+/-]\s*)+\d+\)?|\d+\s*\^\s*\d+)").expect("valid regex")
    })
}

fn search_trigger_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)weather|capital|population").expect("valid regex"))
}

/// Extract the first math expression in the query, if any.
fn math_expression(query: &str) -> Option<String> {
    math_expression_re()
        .find(query)
        .map(|m| m.as_str().to_string())
}

/// Whether the query asks for real-world information.
fn needs_search(query: &str) -> bool {
    search_trigger_re().is_match(query)
}

/// Final record of one agent run.
#[derive(Debug, Clone)]
pub struct AgentOutcome {
    /// Run identifier, usable as a feedback key.
    pub run_id: String,
    /// Final state of the agent's log.
    pub steps: Vec<AgentStep>,
}

/// Orchestrator for the agent executor.
pub struct AgentExecutor {
    provider: Arc<dyn TextProvider>,
    feed: ProgressFeed<AgentStep>,
    calculator: Calculator,
    search: SearchTool,
}

impl AgentExecutor {
    /// Create an agent executor with the default mock tools.
    pub fn new(provider: Arc<dyn TextProvider>) -> Self {
        Self {
            provider,
            feed: ProgressFeed::new(),
            calculator: Calculator::new(),
            search: SearchTool::new(),
        }
    }

    /// Replace the calculator tool.
    pub fn with_calculator(mut self, calculator: Calculator) -> Self {
        self.calculator = calculator;
        self
    }

    /// Replace the search tool.
    pub fn with_search(mut self, search: SearchTool) -> Self {
        self.search = search;
        self
    }

    /// Subscribe to live log updates.
    pub fn subscribe(&self) -> watch::Receiver<Vec<AgentStep>> {
        self.feed.subscribe()
    }

    /// Append one settled log entry after the pacing delay.
    async fn append(&self, kind: AgentStepKind, title: &str, content: &str) {
        tokio::time::sleep(STEP_DELAY).await;
        self.feed.push(AgentStep::settled(kind, title, content));
    }

    /// Run the agent loop to completion.
    pub async fn run(&self, query: &str) -> AgentOutcome {
        let run_id = StrategyId::AgentExecutor.new_run_id();
        info!(run_id = %run_id, "agent run started");
        self.feed.replace(Vec::new());

        let mut observations: Vec<String> = Vec::new();

        // Triggers are evaluated independently up front; execution order is
        // fixed: calculator first, then search.
        if let Some(expression) = math_expression(query) {
            debug!(expression = %expression, "calculator triggered");
            self.append(
                AgentStepKind::Thought,
                "Thought",
                "The user query contains a mathematical expression. I should use the Calculator tool to solve it.",
            )
            .await;
            self.append(
                AgentStepKind::Action,
                &format!("Action: {}", self.calculator.name()),
                &expression,
            )
            .await;
            let result = self.calculator.invoke(&expression).await;
            self.append(AgentStepKind::Observation, "Observation", &result)
                .await;
            observations.push(format!("- Calculator Result: {}", result));
        }

        if needs_search(query) {
            debug!("search triggered");
            self.append(
                AgentStepKind::Thought,
                "Thought",
                "The user query asks for real-world information. I should use the Search tool.",
            )
            .await;
            self.append(
                AgentStepKind::Action,
                &format!("Action: {}", self.search.name()),
                query,
            )
            .await;
            let result = self.search.invoke(query).await;
            self.append(AgentStepKind::Observation, "Observation", &result)
                .await;
            observations.push(format!("- Search Result: \"{}\"", result));
        }

        self.append(
            AgentStepKind::Thought,
            "Thought",
            "I have gathered all necessary information from the tools. Now I will formulate the final answer for the user.",
        )
        .await;

        // Synthesis call, streaming into the final-answer entry. The entry
        // itself appears on the same pacing cadence as the settled ones.
        tokio::time::sleep(STEP_DELAY).await;
        self.feed.push(AgentStep::streaming_answer("Final Answer"));
        let answer_index = self.feed.len() - 1;

        let prompt = format!(
            "You are a helpful assistant. The user asked: \"{}\". You have used tools to gather the following information:\n{}\n\nBased on this, provide a comprehensive final answer to the user.",
            query,
            observations.join("\n")
        );

        let mut fragments = self.provider.stream(&prompt, None).await;
        while let Some(fragment) = fragments.next().await {
            self.feed
                .update(|records| records[answer_index].content.push_str(&fragment));
        }
        self.feed.update(|records| {
            records[answer_index].is_loading = false;
            records[answer_index].is_complete = true;
        });

        info!(run_id = %run_id, "agent run finished");
        AgentOutcome {
            run_id,
            steps: self.feed.snapshot(),
        }
    }
}
