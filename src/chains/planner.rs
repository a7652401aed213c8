//! Planner-executor orchestration.
//!
//! A planning call produces a numbered list of steps, the executor works
//! through them one at a time with the search tool, and a synthesis call
//! streams the final answer from the gathered observations. Plan lines
//! without an ordinal prefix are ignored; a plan with no numbered lines
//! yields zero executor steps and the run proceeds straight to synthesis.

use crate::provider::TextProvider;
use crate::state::{AgentStepKind, ProgressFeed, SlotFeed, StrategyId};
use crate::tools::{SearchTool, Tool};
use futures_util::StreamExt;
use regex::Regex;
use std::sync::Arc;
use std::sync::OnceLock;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info};

/// Pacing delay before each executor action.
const ACTION_DELAY: Duration = Duration::from_millis(200);
/// Pacing delay before each observation (covers the tool call itself).
const OBSERVATION_DELAY: Duration = Duration::from_millis(500);

fn plan_line_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*\d+[.)]\s*").expect("valid regex"))
}

/// Keep only ordinal-prefixed lines, stripped of their prefix.
pub fn parse_plan(plan: &str) -> Vec<String> {
    plan.lines()
        .filter_map(|line| {
            plan_line_re().find(line).map(|m| line[m.end()..].trim().to_string())
        })
        .filter(|item| !item.is_empty())
        .collect()
}

/// Live state of the planning step.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanStep {
    /// Display title for the step.
    pub title: String,
    /// The planning prompt sent to the provider.
    pub prompt: String,
    /// Streamed plan text.
    pub plan: String,
    /// True while the plan is still streaming.
    pub is_loading: bool,
    /// True once the plan finished.
    pub is_complete: bool,
}

/// One settled executor log entry.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionStep {
    /// What kind of entry this is.
    pub kind: AgentStepKind,
    /// Display title for the entry.
    pub title: String,
    /// Entry body.
    pub content: String,
    /// Always true; executor entries appear settled.
    pub is_complete: bool,
}

/// Live state of the synthesis step.
#[derive(Debug, Clone, PartialEq)]
pub struct FinalAnswerStep {
    /// Display title for the step.
    pub title: String,
    /// The synthesis prompt sent to the provider.
    pub prompt: String,
    /// Streamed answer text.
    pub answer: String,
    /// True while the answer is still streaming.
    pub is_loading: bool,
    /// True once the answer finished.
    pub is_complete: bool,
}

/// Final record of one planner-executor run.
#[derive(Debug, Clone)]
pub struct PlannerOutcome {
    /// Run identifier, usable as a feedback key.
    pub run_id: String,
    /// Final state of the planning step.
    pub plan: Option<PlanStep>,
    /// Parsed plan items the executor worked through.
    pub plan_items: Vec<String>,
    /// Final state of the executor log.
    pub execution: Vec<ExecutionStep>,
    /// Final state of the synthesis step.
    pub final_answer: Option<FinalAnswerStep>,
}

/// Orchestrator for the planner-executor strategy.
pub struct PlannerExecutor {
    provider: Arc<dyn TextProvider>,
    search: SearchTool,
    plan_feed: SlotFeed<PlanStep>,
    execution_feed: ProgressFeed<ExecutionStep>,
    answer_feed: SlotFeed<FinalAnswerStep>,
}

impl PlannerExecutor {
    /// Create a planner-executor over the given provider and default search tool.
    pub fn new(provider: Arc<dyn TextProvider>) -> Self {
        Self {
            provider,
            search: SearchTool::new(),
            plan_feed: SlotFeed::new(),
            execution_feed: ProgressFeed::new(),
            answer_feed: SlotFeed::new(),
        }
    }

    /// Replace the search tool.
    pub fn with_search(mut self, search: SearchTool) -> Self {
        self.search = search;
        self
    }

    /// Subscribe to live planning updates.
    pub fn subscribe_plan(&self) -> watch::Receiver<Option<PlanStep>> {
        self.plan_feed.subscribe()
    }

    /// Subscribe to live executor log updates.
    pub fn subscribe_execution(&self) -> watch::Receiver<Vec<ExecutionStep>> {
        self.execution_feed.subscribe()
    }

    /// Subscribe to live synthesis updates.
    pub fn subscribe_answer(&self) -> watch::Receiver<Option<FinalAnswerStep>> {
        self.answer_feed.subscribe()
    }

    /// Run plan, execute, and synthesize for `goal`.
    pub async fn run(&self, goal: &str) -> PlannerOutcome {
        let run_id = StrategyId::PlannerExecutor.new_run_id();
        info!(run_id = %run_id, "planner run started");

        self.plan_feed.clear();
        self.execution_feed.replace(Vec::new());
        self.answer_feed.clear();

        // Phase 1: plan.
        let plan_prompt = format!(
            "You are a world-class planner AI. Your job is to create a simple, step-by-step plan to achieve a user's goal. Respond ONLY with the numbered list of steps. Do not add any preamble.\n\nGoal: \"{}\"\n\nPlan:",
            goal
        );
        self.plan_feed.set(PlanStep {
            title: "Step 1: Create a Plan".to_string(),
            prompt: plan_prompt.clone(),
            plan: String::new(),
            is_loading: true,
            is_complete: false,
        });
        let mut fragments = self.provider.stream(&plan_prompt, None).await;
        while let Some(fragment) = fragments.next().await {
            self.plan_feed.update(|step| step.plan.push_str(&fragment));
        }
        self.plan_feed.update(|step| {
            step.is_loading = false;
            step.is_complete = true;
        });

        let plan_text = self
            .plan_feed
            .snapshot()
            .map(|step| step.plan)
            .unwrap_or_default();
        let plan_items = parse_plan(&plan_text);
        debug!(items = plan_items.len(), "plan parsed");

        // Phase 2: execute each plan item with the search tool.
        let mut observations: Vec<String> = Vec::new();
        for item in &plan_items {
            tokio::time::sleep(ACTION_DELAY).await;
            self.execution_feed.push(ExecutionStep {
                kind: AgentStepKind::Action,
                title: format!("Action: {}", self.search.name()),
                content: item.clone(),
                is_complete: true,
            });

            tokio::time::sleep(OBSERVATION_DELAY).await;
            let result = self.search.invoke(item).await;
            self.execution_feed.push(ExecutionStep {
                kind: AgentStepKind::Observation,
                title: "Observation".to_string(),
                content: result.clone(),
                is_complete: true,
            });
            observations.push(result);
        }

        // Phase 3: synthesize the final answer.
        let answer_prompt = format!(
            "You are a helpful assistant. Based on the following information gathered from your tools, provide a comprehensive final answer to the user's original goal.\n\nOriginal Goal: \"{}\"\n\nGathered Information:\n- {}\n\nFinal Answer:",
            goal,
            observations.join("\n- ")
        );
        self.answer_feed.set(FinalAnswerStep {
            title: "Step 3: Synthesize Final Answer".to_string(),
            prompt: answer_prompt.clone(),
            answer: String::new(),
            is_loading: true,
            is_complete: false,
        });
        let mut fragments = self.provider.stream(&answer_prompt, None).await;
        while let Some(fragment) = fragments.next().await {
            self.answer_feed
                .update(|step| step.answer.push_str(&fragment));
        }
        self.answer_feed.update(|step| {
            step.is_loading = false;
            step.is_complete = true;
        });

        info!(run_id = %run_id, steps = plan_items.len(), "planner run finished");
        PlannerOutcome {
            run_id,
            plan: self.plan_feed.snapshot(),
            plan_items,
            execution: self.execution_feed.snapshot(),
            final_answer: self.answer_feed.snapshot(),
        }
    }
}
