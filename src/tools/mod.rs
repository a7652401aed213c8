//! Mock tool collaborators for the agent and planner orchestrators.
//!
//! Tools are infallible by construction: `invoke` always returns a string,
//! and malformed input produces a descriptive message instead of an error.
//! This keeps the agent loop from ever aborting on a tool failure.

pub mod calculator;
pub mod search;

pub use calculator::Calculator;
pub use search::SearchTool;

/// A tool the orchestrators can invoke with a string input.
///
/// Synchronous from the orchestrator's point of view apart from a fixed
/// simulated latency. Must not fail: invalid input yields a descriptive
/// result string.
#[async_trait::async_trait]
pub trait Tool: Send + Sync {
    /// Tool name as shown in action step titles.
    fn name(&self) -> &str;

    /// Run the tool on the given input.
    async fn invoke(&self, input: &str) -> String;
}
