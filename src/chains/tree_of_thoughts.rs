//! Tree-of-thoughts orchestration.
//!
//! A fixed breadth of candidate openings is generated concurrently, every
//! candidate is scored concurrently by a JSON-returning evaluation call,
//! the best-scoring candidate is selected (first wins on ties), and a
//! synthesis call continues the story from the winner. Evaluation replies
//! that cannot be parsed score zero rather than aborting the run.

use crate::provider::{collect_fragments, TextProvider};
use crate::state::{Evaluation, ProgressFeed, SlotFeed, StrategyId, Thought, ThoughtStatus};
use futures_util::future::join_all;
use futures_util::StreamExt;
use regex::Regex;
use serde_json::Value;
use std::sync::Arc;
use std::sync::OnceLock;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Number of candidate thoughts generated per run.
pub const DEFAULT_BREADTH: usize = 3;

fn fenced_json_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)```json\s*(.*?)```").expect("valid regex"))
}

/// Parse an evaluation reply into a score and justification.
///
/// Accepts either a fenced ```json block or a bare JSON object. Anything
/// unparseable yields a zero score so a single bad reply never sinks the
/// selection phase.
pub fn parse_evaluation(reply: &str) -> Evaluation {
    let body = fenced_json_re()
        .captures(reply)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .unwrap_or(reply)
        .trim();

    match serde_json::from_str::<Value>(body) {
        Ok(value) => {
            let score = match value.get("score") {
                Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
                Some(Value::String(s)) => s.parse().unwrap_or(0.0),
                _ => 0.0,
            };
            let justification = value
                .get("justification")
                .and_then(Value::as_str)
                .unwrap_or("Could not parse justification.")
                .to_string();
            Evaluation {
                score,
                justification,
            }
        }
        Err(_) => Evaluation {
            score: 0.0,
            justification: "Failed to parse JSON evaluation.".to_string(),
        },
    }
}

/// First index holding the maximum score.
fn best_index(thoughts: &[Thought]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (index, thought) in thoughts.iter().enumerate() {
        let score = thought.evaluation.as_ref().map_or(0.0, |e| e.score);
        match best {
            Some((_, top)) if score <= top => {}
            _ => best = Some((index, score)),
        }
    }
    best.map(|(index, _)| index)
}

/// Live state of the synthesis step.
#[derive(Debug, Clone, PartialEq)]
pub struct FinalAnswer {
    /// Streamed continuation text.
    pub text: String,
    /// True while the continuation is still streaming.
    pub is_loading: bool,
    /// True once the continuation finished.
    pub is_complete: bool,
}

/// Final record of one tree-of-thoughts run.
#[derive(Debug, Clone)]
pub struct TreeOfThoughtsOutcome {
    /// Run identifier, usable as a feedback key.
    pub run_id: String,
    /// Final state of every candidate thought.
    pub thoughts: Vec<Thought>,
    /// Index of the selected thought, if any candidates were generated.
    pub selected: Option<usize>,
    /// Final synthesis state. `None` when no candidate was selected.
    pub final_answer: Option<FinalAnswer>,
}

/// Orchestrator for the tree-of-thoughts strategy.
pub struct TreeOfThoughts {
    provider: Arc<dyn TextProvider>,
    breadth: usize,
    thought_feed: ProgressFeed<Thought>,
    answer_feed: SlotFeed<FinalAnswer>,
}

impl TreeOfThoughts {
    /// Create a tree-of-thoughts chain with the default breadth.
    pub fn new(provider: Arc<dyn TextProvider>) -> Self {
        Self {
            provider,
            breadth: DEFAULT_BREADTH,
            thought_feed: ProgressFeed::new(),
            answer_feed: SlotFeed::new(),
        }
    }

    /// Override the number of candidates generated per run.
    pub fn with_breadth(mut self, breadth: usize) -> Self {
        self.breadth = breadth;
        self
    }

    /// Subscribe to live thought updates.
    pub fn subscribe_thoughts(&self) -> watch::Receiver<Vec<Thought>> {
        self.thought_feed.subscribe()
    }

    /// Subscribe to live synthesis updates.
    pub fn subscribe_answer(&self) -> watch::Receiver<Option<FinalAnswer>> {
        self.answer_feed.subscribe()
    }

    /// Generate one candidate, streaming into the thought at `id`.
    async fn generate_one(&self, problem: &str, id: usize) {
        self.thought_feed
            .update(|thoughts| thoughts[id].status = ThoughtStatus::Generating);
        let prompt = format!(
            "You are a creative writer. Generate one unique and creative opening paragraph for a story based on this premise: \"{}\".",
            problem
        );
        let mut fragments = self.provider.stream(&prompt, None).await;
        while let Some(fragment) = fragments.next().await {
            self.thought_feed
                .update(|thoughts| thoughts[id].text.push_str(&fragment));
        }
    }

    /// Evaluate one candidate, attaching the parsed result at `id`.
    async fn evaluate_one(&self, id: usize, text: String) {
        let prompt = format!(
            "Evaluate the following story opening on a scale of 1-10 for its creativity, potential, and engagement. Respond ONLY with a single JSON object with two keys: \"score\" (number) and \"justification\" (string).\n\nOpening: \"{}\"",
            text
        );
        let reply = collect_fragments(self.provider.stream(&prompt, None).await).await;
        let evaluation = parse_evaluation(&reply);
        if evaluation.score == 0.0 {
            warn!(id, "evaluation fell back to zero score");
        }
        self.thought_feed.update(|thoughts| {
            thoughts[id].status = ThoughtStatus::Evaluated;
            thoughts[id].evaluation = Some(evaluation);
        });
    }

    /// Run generation, evaluation, selection, and synthesis for `problem`.
    pub async fn run(&self, problem: &str) -> TreeOfThoughtsOutcome {
        let run_id = StrategyId::TreeOfThoughts.new_run_id();
        info!(run_id = %run_id, breadth = self.breadth, "tree-of-thoughts run started");

        self.thought_feed
            .replace((0..self.breadth).map(Thought::new).collect());
        self.answer_feed.clear();

        if self.breadth == 0 {
            return TreeOfThoughtsOutcome {
                run_id,
                thoughts: Vec::new(),
                selected: None,
                final_answer: None,
            };
        }

        // Phase 1: generate all candidates concurrently.
        join_all((0..self.breadth).map(|id| self.generate_one(problem, id))).await;

        // Phase 2: evaluate all candidates concurrently.
        self.thought_feed.update(|thoughts| {
            for thought in thoughts.iter_mut() {
                thought.status = ThoughtStatus::Evaluating;
            }
        });
        let texts: Vec<String> = self
            .thought_feed
            .snapshot()
            .into_iter()
            .map(|t| t.text)
            .collect();
        join_all(
            texts
                .into_iter()
                .enumerate()
                .map(|(id, text)| self.evaluate_one(id, text)),
        )
        .await;

        // Phase 3: select the winner and discard the rest.
        let thoughts = self.thought_feed.snapshot();
        let selected = best_index(&thoughts);
        if let Some(winner) = selected {
            debug!(winner, "thought selected");
            self.thought_feed.update(|thoughts| {
                for (index, thought) in thoughts.iter_mut().enumerate() {
                    thought.status = if index == winner {
                        ThoughtStatus::Selected
                    } else {
                        ThoughtStatus::Discarded
                    };
                }
            });

            // Phase 4: continue the story from the winner.
            self.answer_feed.set(FinalAnswer {
                text: String::new(),
                is_loading: true,
                is_complete: false,
            });
            let prompt = format!(
                "Continue and conclude the story based on the following selected opening paragraph:\n\n\"{}\"",
                thoughts[winner].text
            );
            let mut fragments = self.provider.stream(&prompt, None).await;
            while let Some(fragment) = fragments.next().await {
                self.answer_feed
                    .update(|answer| answer.text.push_str(&fragment));
            }
            self.answer_feed.update(|answer| {
                answer.is_loading = false;
                answer.is_complete = true;
            });
        }

        info!(run_id = %run_id, ?selected, "tree-of-thoughts run finished");
        TreeOfThoughtsOutcome {
            run_id,
            thoughts: self.thought_feed.snapshot(),
            selected,
            final_answer: self.answer_feed.snapshot(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn thought_with_score(id: usize, score: f64) -> Thought {
        let mut thought = Thought::new(id);
        thought.evaluation = Some(Evaluation {
            score,
            justification: String::new(),
        });
        thought
    }

    #[test]
    fn first_maximum_wins_on_ties() {
        let thoughts = vec![
            thought_with_score(0, 7.0),
            thought_with_score(1, 9.0),
            thought_with_score(2, 9.0),
        ];
        assert_eq!(best_index(&thoughts), Some(1));
    }

    #[test]
    fn best_index_of_empty_slice_is_none() {
        assert_eq!(best_index(&[]), None);
    }

    #[test]
    fn parses_fenced_json_evaluation() {
        let reply = "```json\n{\"score\": 8.5, \"justification\": \"Vivid imagery.\"}\n```";
        let eval = parse_evaluation(reply);
        assert_eq!(eval.score, 8.5);
        assert_eq!(eval.justification, "Vivid imagery.");
    }

    #[test]
    fn parses_bare_json_and_numeric_string_score() {
        let eval = parse_evaluation("{\"score\": \"7\", \"justification\": \"Solid.\"}");
        assert_eq!(eval.score, 7.0);
        assert_eq!(eval.justification, "Solid.");
    }

    #[test]
    fn unparseable_reply_scores_zero() {
        let eval = parse_evaluation("I would rate this a strong 8 out of 10.");
        assert_eq!(eval.score, 0.0);
        assert_eq!(eval.justification, "Failed to parse JSON evaluation.");
    }

    #[test]
    fn missing_justification_gets_placeholder() {
        let eval = parse_evaluation("{\"score\": 6}");
        assert_eq!(eval.score, 6.0);
        assert_eq!(eval.justification, "Could not parse justification.");
    }
}
