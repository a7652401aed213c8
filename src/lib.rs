//! Chain Composition Kit (CCK) - Building blocks for LLM chain orchestration
//!
//! CCK provides streaming-first orchestrators for common LLM composition
//! patterns, all built on a single provider contract:
//!
//! - **`provider`** - The [`provider::TextProvider`] trait and the Gemini implementation
//! - **`chains`** - The orchestration strategies, from simple sequences to tree-of-thoughts
//! - **`state`** - Observable run state shared between orchestrators and their subscribers
//! - **`tools`** - The mock calculator and search tools used by agentic strategies
//! - **`config`** - Environment and `.env` configuration loading
//! - **`feedback`** - Per-run feedback persistence
//!
//! # Example: Running a sequential chain
//!
//! ```ignore
//! use cck::config::EnvironmentLoader;
//! use cck::prelude::*;
//! use std::sync::Arc;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let env = EnvironmentLoader::new(None);
//! let provider = Arc::new(GeminiProvider::from_env(&env)?);
//!
//! let chain = SequentialChain::new(provider);
//! let mut updates = chain.subscribe();
//! let outcome = chain.run(story_steps("a city on the back of a whale")).await;
//!
//! for step in &outcome.steps {
//!     println!("{}\n{}\n", step.title, step.output);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Error posture
//!
//! Orchestrators never abort a run because the provider failed. Provider
//! errors surface as a single human-readable fragment in the affected
//! step's output, and the run carries on to completion. Only local
//! failures, like an unwritable feedback directory, return `Err`.

#![warn(missing_docs)]

pub mod chains;
pub mod config;
pub mod feedback;
pub mod provider;
pub mod state;
pub mod tools;

/// Commonly used types, re-exported for convenience.
pub mod prelude {
    pub use crate::chains::{
        marketing_steps, story_steps, AgentExecutor, AgentOutcome, CustomChain, CustomStepSpec, MapReduceChain,
        MapReduceOutcome, PlannerExecutor, PlannerOutcome, ReflexionChain, RouterChain,
        RunOutcome, SequentialChain, SequentialStep, TreeOfThoughts, TreeOfThoughtsOutcome,
    };
    pub use crate::feedback::{FeedbackStore, Rating, RunFeedback};
    pub use crate::provider::{FragmentStream, GeminiProvider, TextProvider};
    pub use crate::state::{
        AgentStep, AgentStepKind, ChainStep, Priority, ProgressFeed, SlotFeed, StrategyId,
        Thought, ThoughtStatus,
    };
    pub use crate::tools::{Calculator, SearchTool, Tool};
}
