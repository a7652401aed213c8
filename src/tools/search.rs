//! Mock search tool with a canned knowledge corpus.
//!
//! Lookup is keyword containment: an entry matches when every one of its
//! keywords appears in the search term, case-insensitively. Unmatched terms
//! return a descriptive no-result string.

use crate::tools::Tool;
use std::time::Duration;
use tracing::debug;

/// Simulated tool latency applied per invocation.
const DEFAULT_LATENCY: Duration = Duration::from_millis(800);

/// One canned corpus entry.
#[derive(Debug, Clone)]
pub struct SearchEntry {
    keywords: Vec<String>,
    answer: String,
}

impl SearchEntry {
    /// Create an entry matched when all keywords appear in the term.
    pub fn new(keywords: &[&str], answer: &str) -> Self {
        Self {
            keywords: keywords.iter().map(|k| k.to_lowercase()).collect(),
            answer: answer.to_string(),
        }
    }
}

/// Search tool over a fixed corpus of canned answers.
#[derive(Debug, Clone)]
pub struct SearchTool {
    latency: Duration,
    corpus: Vec<SearchEntry>,
}

impl SearchTool {
    /// Create a search tool with the built-in demo corpus.
    pub fn new() -> Self {
        Self::with_corpus(vec![
            SearchEntry::new(&["weather", "london"], "Sunny with a high of 18°C."),
            SearchEntry::new(&["capital", "japan"], "The capital of Japan is Tokyo."),
            SearchEntry::new(
                &["ceo of microsoft"],
                "Satya Nadella is the CEO of Microsoft.",
            ),
            SearchEntry::new(
                &["microsoft", "revenue", "2023"],
                "Microsoft's revenue for the fiscal year 2023 was $211.9 billion.",
            ),
            SearchEntry::new(
                &["microsoft", "famous product"],
                "Microsoft's most famous product is the Windows operating system.",
            ),
        ])
    }

    /// Create a search tool over a custom corpus.
    pub fn with_corpus(corpus: Vec<SearchEntry>) -> Self {
        Self {
            latency: DEFAULT_LATENCY,
            corpus,
        }
    }

    /// Override the simulated latency.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Look a term up in the corpus. First matching entry wins.
    pub fn lookup(&self, term: &str) -> String {
        let needle = term.to_lowercase();
        for entry in &self.corpus {
            if entry.keywords.iter().all(|k| needle.contains(k)) {
                return entry.answer.clone();
            }
        }
        format!("No information found for \"{}\"", term)
    }
}

impl Default for SearchTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Tool for SearchTool {
    fn name(&self) -> &str {
        "Search"
    }

    async fn invoke(&self, input: &str) -> String {
        tokio::time::sleep(self.latency).await;
        let result = self.lookup(input);
        debug!(input, result = %result, "search invoked");
        result
    }
}
