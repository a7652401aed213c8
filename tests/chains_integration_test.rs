//! End-to-end tests for the chain orchestrators against a scripted provider.
//!
//! The scripted provider matches prompts by substring and replies with
//! queued, multi-fragment responses, optionally after a simulated delay.
//! All tests run on paused virtual time so tool latencies cost nothing.

use async_trait::async_trait;
use cck::chains::{
    marketing_steps, story_steps, AgentExecutor, CustomChain, CustomStepSpec, MapReduceChain,
    PlannerExecutor, ReflexionChain, RouterChain, SequentialChain, TreeOfThoughts,
};
use cck::provider::{FragmentStream, TextProvider};
use cck::state::{AgentStepKind, StrategyId, ThoughtStatus};
use futures_util::stream;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

/// One prompt-matching rule: when the prompt contains `pattern`, pop the
/// next queued reply. Replies are emitted as multiple fragments.
struct Rule {
    pattern: String,
    replies: VecDeque<String>,
    delay: Option<Duration>,
}

/// Deterministic in-memory provider for driving the orchestrators.
struct ScriptedProvider {
    rules: Mutex<Vec<Rule>>,
    default_reply: String,
}

impl ScriptedProvider {
    fn new(default_reply: &str) -> Self {
        Self {
            rules: Mutex::new(Vec::new()),
            default_reply: default_reply.to_string(),
        }
    }

    fn on(self, pattern: &str, replies: &[&str]) -> Self {
        self.on_with_delay(pattern, replies, None)
    }

    fn on_with_delay(self, pattern: &str, replies: &[&str], delay: Option<Duration>) -> Self {
        self.rules.lock().unwrap().push(Rule {
            pattern: pattern.to_string(),
            replies: replies.iter().map(|r| r.to_string()).collect(),
            delay,
        });
        self
    }

    fn reply_for(&self, prompt: &str) -> (String, Option<Duration>) {
        let mut rules = self.rules.lock().unwrap();
        for rule in rules.iter_mut() {
            if prompt.contains(&rule.pattern) {
                if let Some(reply) = rule.replies.pop_front() {
                    return (reply, rule.delay);
                }
            }
        }
        (self.default_reply.clone(), None)
    }
}

#[async_trait]
impl TextProvider for ScriptedProvider {
    async fn stream(&self, prompt: &str, _system_instruction: Option<&str>) -> FragmentStream {
        let (reply, delay) = self.reply_for(prompt);
        // Split replies into word fragments so accumulation is exercised.
        let fragments: Vec<String> = reply
            .split_inclusive(' ')
            .map(str::to_string)
            .collect();
        Box::pin(stream::unfold(
            (fragments.into_iter(), delay),
            |(mut fragments, delay)| async move {
                if let Some(delay) = delay {
                    tokio::time::sleep(delay).await;
                }
                fragments.next().map(|f| (f, (fragments, None)))
            },
        ))
    }

    fn provider_name(&self) -> &str {
        "scripted"
    }
}

#[tokio::test(start_paused = true)]
async fn sequential_chain_threads_outputs_and_completes_in_order() {
    let provider = Arc::new(
        ScriptedProvider::new("unused")
            .on("creative title", &["\"The Last Lighthouse\""])
            .on("short story synopsis", &["A keeper tends a dying star."]),
    );
    let chain = SequentialChain::new(provider);

    let outcome = chain.run(story_steps("lighthouses")).await;

    assert!(outcome.run_id.starts_with("sequential-"));
    assert_eq!(outcome.steps.len(), 2);
    assert_eq!(outcome.steps[0].output, "\"The Last Lighthouse\"");
    // The second prompt is built from the first output.
    assert!(outcome.steps[1].prompt.contains("\"The Last Lighthouse\""));
    assert_eq!(outcome.steps[1].output, "A keeper tends a dying star.");
    for step in &outcome.steps {
        assert!(step.is_complete);
        assert!(!step.is_loading);
    }
}

#[tokio::test(start_paused = true)]
async fn sequential_chain_is_deterministic_across_runs() {
    for _ in 0..2 {
        let provider = Arc::new(
            ScriptedProvider::new("unused")
                .on("creative title", &["Title A"])
                .on("short story synopsis", &["Synopsis A"]),
        );
        let chain = SequentialChain::new(provider);
        let outcome = chain.run(story_steps("robots")).await;
        let outputs: Vec<&str> = outcome.steps.iter().map(|s| s.output.as_str()).collect();
        assert_eq!(outputs, vec!["Title A", "Synopsis A"]);
    }
}

#[tokio::test(start_paused = true)]
async fn router_tie_break_prefers_history_over_math() {
    let provider = Arc::new(
        ScriptedProvider::new("expert answer")
            .on("Categorize the following query", &["could be math or history"]),
    );
    let chain = RouterChain::new(provider);

    let outcome = chain.run("When was calculus invented?").await;

    assert_eq!(outcome.steps[0].output, "Routing to: HISTORY expert");
    assert_eq!(outcome.steps[1].title, "Step 2: History Expert Answer");
    assert_eq!(outcome.steps[1].output, "expert answer");
}

#[tokio::test(start_paused = true)]
async fn router_unknown_category_takes_fallback_path() {
    let provider = Arc::new(
        ScriptedProvider::new("Sorry, I can't tell what field that is.")
            .on("Categorize the following query", &["philosophy"]),
    );
    let chain = RouterChain::new(provider);

    let outcome = chain.run("What is the meaning of life?").await;

    assert_eq!(outcome.steps[0].output, "Routing to: UNKNOWN expert");
    assert!(outcome.steps[1].prompt.contains("ask them to rephrase"));
    assert!(outcome.steps[1].is_complete);
}

#[tokio::test(start_paused = true)]
async fn agent_runs_calculator_before_search_when_both_trigger() {
    let provider = Arc::new(ScriptedProvider::new("It is 60, and London is sunny."));
    let agent = AgentExecutor::new(provider);

    let outcome = agent
        .run("What is (5 * 12) and what is the weather in London?")
        .await;

    let kinds: Vec<AgentStepKind> = outcome.steps.iter().map(|s| s.kind).collect();
    assert_eq!(
        kinds,
        vec![
            AgentStepKind::Thought,
            AgentStepKind::Action,
            AgentStepKind::Observation,
            AgentStepKind::Thought,
            AgentStepKind::Action,
            AgentStepKind::Observation,
            AgentStepKind::Thought,
            AgentStepKind::FinalAnswer,
        ]
    );
    assert_eq!(outcome.steps[1].title, "Action: Calculator");
    assert_eq!(outcome.steps[1].content, "(5 * 12)");
    assert_eq!(outcome.steps[2].content, "60");
    assert_eq!(outcome.steps[4].title, "Action: Search");
    assert_eq!(outcome.steps[5].content, "Sunny with a high of 18°C.");
    let last = outcome.steps.last().unwrap();
    assert_eq!(last.content, "It is 60, and London is sunny.");
    assert!(last.is_complete);
}

#[tokio::test(start_paused = true)]
async fn agent_with_no_triggers_still_produces_a_final_answer() {
    let provider = Arc::new(ScriptedProvider::new("Here is my answer."));
    let agent = AgentExecutor::new(provider);

    let outcome = agent.run("Tell me a joke").await;

    assert_eq!(outcome.steps.len(), 2);
    assert_eq!(outcome.steps[0].kind, AgentStepKind::Thought);
    assert_eq!(outcome.steps[1].kind, AgentStepKind::FinalAnswer);
    assert_eq!(outcome.steps[1].content, "Here is my answer.");
}

#[tokio::test(start_paused = true)]
async fn agent_paces_the_final_answer_entry_like_the_others() {
    let provider = Arc::new(ScriptedProvider::new("Here is my answer."));
    let agent = AgentExecutor::new(provider);

    // No tool triggers: one paced thought plus the paced final-answer entry.
    let start = tokio::time::Instant::now();
    agent.run("Tell me a joke").await;

    assert!(start.elapsed() >= Duration::from_millis(500));
}

#[tokio::test(start_paused = true)]
async fn map_reduce_preserves_chunk_order_despite_unequal_latency() {
    // The first chunk's summary is delayed well past the others.
    let provider = Arc::new(
        ScriptedProvider::new("final synthesis")
            .on_with_delay("chunk alpha", &["Summary A"], Some(Duration::from_secs(5)))
            .on("chunk beta", &["Summary B"])
            .on("chunk gamma", &["Summary C"]),
    );
    let chain = MapReduceChain::new(provider);

    let outcome = chain
        .run("Summarize this", "chunk alpha\n---\nchunk beta\n---\nchunk gamma")
        .await;

    let summaries: Vec<&str> = outcome
        .map_steps
        .iter()
        .map(|s| s.summary.as_str())
        .collect();
    assert_eq!(summaries, vec!["Summary A", "Summary B", "Summary C"]);

    let reduce = outcome.reduce.expect("reduce step present");
    let a = reduce.combined_summary.find("Summary of Chunk 1:\nSummary A").unwrap();
    let b = reduce.combined_summary.find("Summary of Chunk 2:\nSummary B").unwrap();
    let c = reduce.combined_summary.find("Summary of Chunk 3:\nSummary C").unwrap();
    assert!(a < b && b < c);
    assert_eq!(reduce.final_summary, "final synthesis");
    assert!(reduce.is_complete);
}

#[tokio::test(start_paused = true)]
async fn map_reduce_of_empty_document_still_runs_the_reduce_call() {
    let provider = Arc::new(ScriptedProvider::new("There was nothing to summarize."));
    let chain = MapReduceChain::new(provider);

    let outcome = chain.run("Summarize this", "  \n---\n ").await;

    assert!(outcome.map_steps.is_empty());
    let reduce = outcome.reduce.expect("reduce step present");
    assert_eq!(reduce.combined_summary, "");
    assert_eq!(reduce.final_summary, "There was nothing to summarize.");
    assert!(reduce.is_complete);
}

#[tokio::test(start_paused = true)]
async fn reflexion_runs_four_steps_each_feeding_the_next() {
    let provider = Arc::new(
        ScriptedProvider::new("unused")
            .on("Complete the following task", &["first attempt"])
            .on("strict reviewer", &["too vague"])
            .on("Reflect on it", &["add specifics"])
            .on("Rewrite your response", &["revised attempt"]),
    );
    let chain = ReflexionChain::new(provider);

    let outcome = chain.run("Explain entropy").await;

    assert!(outcome.run_id.starts_with("reflexion-"));
    assert_eq!(outcome.steps.len(), 4);
    assert_eq!(outcome.steps[0].output, "first attempt");
    assert!(outcome.steps[1].prompt.contains("first attempt"));
    assert!(outcome.steps[2].prompt.contains("too vague"));
    assert!(outcome.steps[3].prompt.contains("add specifics"));
    assert_eq!(outcome.steps[3].output, "revised attempt");
    assert!(outcome.steps.iter().all(|s| s.is_complete));
}

#[tokio::test(start_paused = true)]
async fn planner_executes_each_plan_item_with_the_search_tool() {
    let provider = Arc::new(
        ScriptedProvider::new("Satya Nadella leads a company with $211.9 billion in revenue.")
            .on(
                "world-class planner",
                &["1. Find the CEO of Microsoft\n2. Microsoft revenue 2023"],
            ),
    );
    let planner = PlannerExecutor::new(provider);

    let outcome = planner.run("Report on Microsoft leadership").await;

    assert_eq!(
        outcome.plan_items,
        vec!["Find the CEO of Microsoft", "Microsoft revenue 2023"]
    );
    assert_eq!(outcome.execution.len(), 4);
    assert_eq!(outcome.execution[0].kind, AgentStepKind::Action);
    assert_eq!(outcome.execution[0].content, "Find the CEO of Microsoft");
    assert_eq!(
        outcome.execution[1].content,
        "Satya Nadella is the CEO of Microsoft."
    );
    assert_eq!(
        outcome.execution[3].content,
        "Microsoft's revenue for the fiscal year 2023 was $211.9 billion."
    );
    let answer = outcome.final_answer.expect("final answer present");
    assert!(answer.is_complete);
    assert!(answer.prompt.contains("Satya Nadella is the CEO of Microsoft."));
}

#[tokio::test(start_paused = true)]
async fn planner_with_unnumbered_plan_runs_zero_executor_steps() {
    let provider = Arc::new(
        ScriptedProvider::new("I had nothing to work with.")
            .on("world-class planner", &["I cannot plan that."]),
    );
    let planner = PlannerExecutor::new(provider);

    let outcome = planner.run("Do the impossible").await;

    assert!(outcome.plan_items.is_empty());
    assert!(outcome.execution.is_empty());
    assert!(outcome.final_answer.expect("final answer present").is_complete);
}

#[tokio::test(start_paused = true)]
async fn tree_of_thoughts_selects_first_highest_scoring_candidate() {
    // Generation pops distinct openings; evaluations are keyed on the
    // opening text so scoring is independent of completion order.
    let provider = Arc::new(
        ScriptedProvider::new("And so the story ends.")
            .on(
                "creative writer",
                &["Opening A", "Opening B", "Opening C"],
            )
            .on("Opening A", &["{\"score\": 7, \"justification\": \"fine\"}"])
            .on("Opening B", &["{\"score\": 9, \"justification\": \"strong\"}"])
            .on("Opening C", &["{\"score\": 9, \"justification\": \"strong\"}"]),
    );
    let chain = TreeOfThoughts::new(provider);

    let outcome = chain.run("a clockwork forest").await;

    assert_eq!(outcome.thoughts.len(), 3);
    let scores: Vec<f64> = outcome
        .thoughts
        .iter()
        .map(|t| t.evaluation.as_ref().unwrap().score)
        .collect();
    assert_eq!(scores, vec![7.0, 9.0, 9.0]);
    assert_eq!(outcome.selected, Some(1));
    assert_eq!(outcome.thoughts[1].status, ThoughtStatus::Selected);
    assert_eq!(outcome.thoughts[0].status, ThoughtStatus::Discarded);
    assert_eq!(outcome.thoughts[2].status, ThoughtStatus::Discarded);
    let answer = outcome.final_answer.expect("final answer present");
    assert_eq!(answer.text, "And so the story ends.");
    assert!(answer.is_complete);
}

#[tokio::test(start_paused = true)]
async fn tree_of_thoughts_survives_unparseable_evaluations() {
    let provider = Arc::new(
        ScriptedProvider::new("conclusion")
            .on("creative writer", &["Opening A", "Opening B"])
            .on("Opening A", &["I'd give it an 8."])
            .on("Opening B", &["{\"score\": 3, \"justification\": \"weak\"}"]),
    );
    let chain = TreeOfThoughts::new(provider).with_breadth(2);

    let outcome = chain.run("a silent city").await;

    assert_eq!(
        outcome.thoughts[0].evaluation.as_ref().unwrap().justification,
        "Failed to parse JSON evaluation."
    );
    // The parseable low score still beats the zero fallback.
    assert_eq!(outcome.selected, Some(1));
}

#[tokio::test(start_paused = true)]
async fn custom_chain_resolves_placeholders_and_marks_bad_references() {
    let provider = Arc::new(
        ScriptedProvider::new("unused")
            .on("List three colors", &["red, green, blue"])
            .on("red, green, blue", &["I like blue best."]),
    );
    let chain = CustomChain::new(provider);

    let outcome = chain
        .run(vec![
            CustomStepSpec::new("Colors", "List three colors"),
            CustomStepSpec::new(
                "",
                "Pick a favorite from {{output_1}} but ignore {{output_5}}",
            ),
        ])
        .await;

    assert_eq!(outcome.steps[0].output, "red, green, blue");
    assert_eq!(outcome.steps[1].title, "Step 2");
    assert_eq!(
        outcome.steps[1].prompt,
        "Pick a favorite from red, green, blue but ignore [Error: Output of step 5 not found]"
    );
    assert_eq!(outcome.steps[1].output, "I like blue best.");
}

#[tokio::test(start_paused = true)]
async fn provider_failure_masks_as_output_and_run_completes() {
    // A provider whose reply is the generic error message behaves exactly
    // like any other fragment stream; the chain must finish normally.
    let provider = Arc::new(ScriptedProvider::new(
        "An error occurred while generating the response. Please try again.",
    ));
    let chain = SequentialChain::new(provider);

    let outcome = chain.run(marketing_steps("a teapot")).await;

    assert_eq!(outcome.steps.len(), 3);
    for step in &outcome.steps {
        assert!(step.is_complete);
        assert!(!step.is_loading);
        assert_eq!(
            step.output,
            "An error occurred while generating the response. Please try again."
        );
    }
}

#[tokio::test(start_paused = true)]
async fn run_ids_carry_their_strategy_label() {
    let provider = Arc::new(ScriptedProvider::new("ok"));
    let chain = SequentialChain::new(provider.clone()).with_run_label(StrategyId::Simple);
    let outcome = chain
        .run(vec![cck::chains::SequentialStep::new(
            "Step 1",
            |_| "Say ok".to_string(),
        )])
        .await;
    assert!(outcome.run_id.starts_with("simple-"));
}

#[tokio::test(start_paused = true)]
async fn subscribers_observe_intermediate_loading_states() {
    let provider = Arc::new(
        ScriptedProvider::new("done")
            .on("creative title", &["Title"])
            .on("short story synopsis", &["Synopsis"]),
    );
    let chain = SequentialChain::new(provider);
    let mut updates = chain.subscribe();

    let outcome = chain.run(story_steps("time travel")).await;

    // The receiver holds the latest value; after the run it matches the outcome.
    let seen = updates.borrow_and_update().clone();
    assert_eq!(seen.len(), outcome.steps.len());
    assert!(seen.iter().all(|s| s.is_complete));
}
