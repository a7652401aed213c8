//! Step record types shared by the chain orchestrators.
//!
//! Every strategy reports progress through one of three record shapes:
//! [`ChainStep`] for linear chains, [`AgentStep`] for reason/act/observe
//! logs, and [`Thought`] for tree-of-thoughts candidate branches. Records
//! are append-only during a run; the only in-place updates are output
//! accumulation and the loading/complete flag flips.

use serde::{Deserialize, Serialize};

/// Advisory priority tag attached to a chain step.
///
/// Purely a label for consumers; it has no effect on execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// Low priority.
    Low,
    /// Medium priority.
    Medium,
    /// High priority.
    High,
}

/// One unit of visible progress in a linear chain.
///
/// A step begins neither loading nor complete, transitions to loading when
/// its call is dispatched, and to complete when its stream ends. `output`
/// grows monotonically while the step is loading; it never shrinks mid-step.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChainStep {
    /// Human-readable label. May be rewritten mid-run (the router relabels
    /// its second step with the resolved expert name).
    pub title: String,
    /// Fully resolved prompt sent to the backend. Empty until resolved.
    pub prompt: String,
    /// Accumulated output text.
    pub output: String,
    /// True while the step's stream is in flight.
    pub is_loading: bool,
    /// True once the step's stream has ended.
    pub is_complete: bool,
    /// Optional advisory priority tag.
    pub priority: Option<Priority>,
}

impl ChainStep {
    /// Create a step that has not been dispatched yet.
    pub fn pending(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            prompt: String::new(),
            output: String::new(),
            is_loading: false,
            is_complete: false,
            priority: None,
        }
    }

    /// Attach a priority tag.
    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Mark the step as dispatched with its resolved prompt.
    pub fn begin(&mut self, prompt: impl Into<String>) {
        self.prompt = prompt.into();
        self.is_loading = true;
        self.is_complete = false;
    }

    /// Append one streamed fragment to the output.
    pub fn append(&mut self, fragment: &str) {
        self.output.push_str(fragment);
    }

    /// Mark the step's stream as ended.
    pub fn finish(&mut self) {
        self.is_loading = false;
        self.is_complete = true;
    }
}

/// Kind of one agent log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AgentStepKind {
    /// A reasoning step explaining the next decision.
    Thought,
    /// A tool invocation with its input.
    Action,
    /// The result a tool returned.
    Observation,
    /// The synthesized answer, streamed from the backend.
    FinalAnswer,
}

/// One entry in an agent's reasoning/acting/observing log.
///
/// Entries are appended and never mutated afterwards, except the
/// final-answer entry whose `content` accumulates while streaming.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentStep {
    /// What kind of entry this is.
    pub kind: AgentStepKind,
    /// Display title, e.g. `Action: Calculator`.
    pub title: String,
    /// Entry body: reasoning text, tool input, tool result, or the answer.
    pub content: String,
    /// True while the final answer is streaming.
    pub is_loading: bool,
    /// True once the entry is settled.
    pub is_complete: bool,
}

impl AgentStep {
    /// Create a settled log entry.
    pub fn settled(kind: AgentStepKind, title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.into(),
            content: content.into(),
            is_loading: false,
            is_complete: true,
        }
    }

    /// Create the streaming final-answer entry.
    pub fn streaming_answer(title: impl Into<String>) -> Self {
        Self {
            kind: AgentStepKind::FinalAnswer,
            title: title.into(),
            content: String::new(),
            is_loading: true,
            is_complete: false,
        }
    }
}

/// Lifecycle of a tree-of-thoughts candidate branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThoughtStatus {
    /// Created, not yet dispatched.
    Pending,
    /// Generation call in flight.
    Generating,
    /// Evaluation call in flight.
    Evaluating,
    /// Evaluation attached.
    Evaluated,
    /// Chosen as the best branch. Exactly one per run.
    Selected,
    /// Not chosen.
    Discarded,
}

/// Structured judgment of one thought.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Evaluation {
    /// Numeric score, expected range 1-10; 0 on parse failure.
    pub score: f64,
    /// Free-text justification, or a placeholder on parse failure.
    pub justification: String,
}

/// One candidate branch in a tree-of-thoughts run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Thought {
    /// Position index, stable for the run.
    pub id: usize,
    /// Accumulated candidate text.
    pub text: String,
    /// Current lifecycle status.
    pub status: ThoughtStatus,
    /// Attached once the status reaches `Evaluated`.
    pub evaluation: Option<Evaluation>,
}

impl Thought {
    /// Create a pending thought at the given index.
    pub fn new(id: usize) -> Self {
        Self {
            id,
            text: String::new(),
            status: ThoughtStatus::Pending,
            evaluation: None,
        }
    }
}
