//! Run state: step records, observable feeds, and run identity.
//!
//! All orchestrators share this module and the provider contract; no
//! orchestrator depends on another. Records live in memory for the duration
//! of one run and are fully replaced when the next run starts.

pub mod feed;
pub mod step;
pub mod strategy;

pub use feed::{ProgressFeed, SlotFeed};
pub use step::{
    AgentStep, AgentStepKind, ChainStep, Evaluation, Priority, Thought, ThoughtStatus,
};
pub use strategy::StrategyId;
