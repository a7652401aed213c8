//! Map-reduce orchestration over delimiter-split documents.
//!
//! The document is split on a fixed delimiter into chunks, every chunk is
//! summarized concurrently against the user's query, and a single reduce
//! call synthesizes the summaries into the final answer. Map output
//! ordering follows the original chunk order regardless of which summaries
//! finish first.

use crate::provider::TextProvider;
use crate::state::{ProgressFeed, SlotFeed, StrategyId};
use futures_util::future::join_all;
use futures_util::StreamExt;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;

/// Separator between document chunks.
pub const CHUNK_DELIMITER: &str = "---";

/// Live state of one map task.
#[derive(Debug, Clone, PartialEq)]
pub struct MapStep {
    /// The chunk of source text this task summarizes.
    pub chunk: String,
    /// Streamed summary text.
    pub summary: String,
    /// True while the summary is still streaming.
    pub is_loading: bool,
    /// True once the summary finished.
    pub is_complete: bool,
}

impl MapStep {
    fn pending(chunk: &str) -> Self {
        Self {
            chunk: chunk.to_string(),
            summary: String::new(),
            is_loading: true,
            is_complete: false,
        }
    }
}

/// Live state of the reduce phase.
#[derive(Debug, Clone, PartialEq)]
pub struct ReduceStep {
    /// The concatenated, ordered chunk summaries handed to the reducer.
    pub combined_summary: String,
    /// Streamed final answer.
    pub final_summary: String,
    /// True while the final answer is still streaming.
    pub is_loading: bool,
    /// True once the final answer finished.
    pub is_complete: bool,
}

/// Final record of one map-reduce run.
#[derive(Debug, Clone)]
pub struct MapReduceOutcome {
    /// Run identifier, usable as a feedback key.
    pub run_id: String,
    /// Final state of every map task, in chunk order.
    pub map_steps: Vec<MapStep>,
    /// Final reduce state. Always present once a run completes; a document
    /// with no chunks still gets a reduce call over empty summaries.
    pub reduce: Option<ReduceStep>,
}

/// Orchestrator for the map-reduce strategy.
pub struct MapReduceChain {
    provider: Arc<dyn TextProvider>,
    map_feed: ProgressFeed<MapStep>,
    reduce_feed: SlotFeed<ReduceStep>,
}

impl MapReduceChain {
    /// Create a map-reduce chain over the given provider.
    pub fn new(provider: Arc<dyn TextProvider>) -> Self {
        Self {
            provider,
            map_feed: ProgressFeed::new(),
            reduce_feed: SlotFeed::new(),
        }
    }

    /// Subscribe to live map-task updates.
    pub fn subscribe_map(&self) -> watch::Receiver<Vec<MapStep>> {
        self.map_feed.subscribe()
    }

    /// Subscribe to live reduce updates.
    pub fn subscribe_reduce(&self) -> watch::Receiver<Option<ReduceStep>> {
        self.reduce_feed.subscribe()
    }

    /// Split a document into trimmed, non-empty chunks.
    pub fn split_chunks(document: &str) -> Vec<String> {
        document
            .split(CHUNK_DELIMITER)
            .map(str::trim)
            .filter(|chunk| !chunk.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Summarize one chunk, streaming into the map feed at `index`.
    async fn map_one(&self, query: &str, chunk: &str, index: usize) {
        let prompt = format!(
            "{}\n\nHere is the relevant text chunk:\n\"\"\"\n{}\n\"\"\"\n\nProvide a concise summary of this chunk.",
            query, chunk
        );
        let mut fragments = self.provider.stream(&prompt, None).await;
        while let Some(fragment) = fragments.next().await {
            self.map_feed
                .update(|steps| steps[index].summary.push_str(&fragment));
        }
        self.map_feed.update(|steps| {
            steps[index].is_loading = false;
            steps[index].is_complete = true;
        });
    }

    /// Run map then reduce over `document` for `query`.
    pub async fn run(&self, query: &str, document: &str) -> MapReduceOutcome {
        let run_id = StrategyId::MapReduce.new_run_id();
        info!(run_id = %run_id, "map-reduce run started");

        let chunks = Self::split_chunks(document);
        self.map_feed
            .replace(chunks.iter().map(|c| MapStep::pending(c)).collect());
        self.reduce_feed.clear();

        // All map tasks interleave on this task; the barrier guarantees every
        // summary has settled before the reduce prompt is assembled.
        let tasks = chunks
            .iter()
            .enumerate()
            .map(|(index, chunk)| self.map_one(query, chunk, index));
        join_all(tasks).await;

        let map_steps = self.map_feed.snapshot();
        let combined = map_steps
            .iter()
            .enumerate()
            .map(|(i, step)| format!("Summary of Chunk {}:\n{}", i + 1, step.summary))
            .collect::<Vec<_>>()
            .join("\n\n");

        self.reduce_feed.set(ReduceStep {
            combined_summary: combined.clone(),
            final_summary: String::new(),
            is_loading: true,
            is_complete: false,
        });

        let prompt = format!(
            "The following are summaries from different parts of a larger document. Synthesize them into a single, cohesive final answer that addresses the original query.\n\nOriginal Query: {}\n\nSummaries:\n\"\"\"\n{}\n\"\"\"\n\nFinal Answer:",
            query, combined
        );
        let mut fragments = self.provider.stream(&prompt, None).await;
        while let Some(fragment) = fragments.next().await {
            self.reduce_feed
                .update(|step| step.final_summary.push_str(&fragment));
        }
        self.reduce_feed.update(|step| {
            step.is_loading = false;
            step.is_complete = true;
        });

        info!(run_id = %run_id, chunks = map_steps.len(), "map-reduce run finished");
        MapReduceOutcome {
            run_id,
            map_steps,
            reduce: self.reduce_feed.snapshot(),
        }
    }
}
