//! Streaming text backend contract.
//!
//! The orchestrators depend only on this trait: submit a prompt with an
//! optional system instruction, receive a finite lazy sequence of text
//! fragments. Concatenating the fragments in arrival order reconstructs the
//! full response.

use futures_util::stream::{self, Stream, StreamExt};
use std::pin::Pin;

/// Finite, non-restartable sequence of UTF-8 text fragments.
pub type FragmentStream = Pin<Box<dyn Stream<Item = String> + Send>>;

/// Streaming text generation backend.
///
/// Implementations must never yield an error through the stream and must
/// never yield an empty sequence: on any internal failure the stream yields
/// exactly one human-readable error fragment and ends, so callers that
/// blindly concatenate fragments still obtain a displayable string.
#[async_trait::async_trait]
pub trait TextProvider: Send + Sync {
    /// Submit a prompt and stream the response.
    ///
    /// # Arguments
    /// * `prompt` - Fully resolved prompt text.
    /// * `system_instruction` - Optional system instruction for this call.
    ///
    /// # Returns
    /// Lazy fragment sequence, terminated by natural exhaustion.
    async fn stream(&self, prompt: &str, system_instruction: Option<&str>) -> FragmentStream;

    /// Backend name for logging and debugging.
    fn provider_name(&self) -> &str;
}

/// Wrap a single fragment as a one-item stream.
///
/// Used for the error-fragment substitution path.
pub fn single_fragment(text: impl Into<String>) -> FragmentStream {
    Box::pin(stream::iter(vec![text.into()]))
}

/// Drain a fragment stream into the full response text.
pub async fn collect_fragments(mut fragments: FragmentStream) -> String {
    let mut full = String::new();
    while let Some(fragment) = fragments.next().await {
        full.push_str(&fragment);
    }
    full
}
