//! Gemini streaming backend.
//!
//! Talks to the Generative Language API's `streamGenerateContent` endpoint
//! with `alt=sse` and forwards text fragments as they arrive. All failure
//! modes degrade to the single error-fragment contract of
//! [`TextProvider`](super::TextProvider); this provider never yields an
//! `Err` through its stream.

use crate::config::EnvironmentLoader;
use crate::provider::error::ProviderError;
use crate::provider::traits::{single_fragment, FragmentStream, TextProvider};
use anyhow::{Context, Result};
use futures_util::StreamExt;
use serde_json::{json, Value};
use tracing::{debug, warn};

/// Model used when none is configured.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Streaming text provider backed by the Gemini API.
pub struct GeminiProvider {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiProvider {
    /// Create a provider with an explicit credential and the default model.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Create a provider from the environment.
    ///
    /// Fails when `GEMINI_API_KEY` is not set - supplying a credential is the
    /// caller's precondition, not something the core works around.
    pub fn from_env(env: &EnvironmentLoader) -> Result<Self> {
        let api_key = env
            .api_key()
            .context("GEMINI_API_KEY not set")?;
        Ok(Self::new(api_key).with_model(env.model()))
    }

    /// Override the model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Override the API base URL. Intended for tests against a local server.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:streamGenerateContent?alt=sse",
            self.base_url, self.model
        )
    }

    fn request_body(prompt: &str, system_instruction: Option<&str>) -> Value {
        let mut body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
        });
        if let Some(instruction) = system_instruction {
            body["systemInstruction"] = json!({ "parts": [{ "text": instruction }] });
        }
        body
    }
}

/// Extract the payload of one SSE event, if it carries data.
fn event_data(event: &str) -> Option<&str> {
    event
        .lines()
        .find_map(|line| line.strip_prefix("data:").map(str::trim))
}

/// Pull the concatenated text parts out of one streamed response chunk.
fn extract_text(chunk: &Value) -> String {
    let mut text = String::new();
    if let Some(parts) = chunk
        .pointer("/candidates/0/content/parts")
        .and_then(Value::as_array)
    {
        for part in parts {
            if let Some(piece) = part.get("text").and_then(Value::as_str) {
                text.push_str(piece);
            }
        }
    }
    text
}

/// Classify an HTTP error response into the provider error taxonomy.
fn classify_http_error(status: reqwest::StatusCode, body: &str) -> ProviderError {
    let credential_status = matches!(status.as_u16(), 401 | 403);
    let credential_body = status == reqwest::StatusCode::BAD_REQUEST
        && body.to_lowercase().contains("api key");
    if credential_status || credential_body {
        ProviderError::InvalidCredential
    } else {
        ProviderError::Request(format!("API error {}: {}", status, body))
    }
}

/// Drive one SSE byte stream, forwarding text fragments over `tx`.
///
/// Guarantees at least one fragment is sent: a response that ends without
/// yielding any extractable text (safety-blocked candidates, unparseable
/// events) produces the generic error fragment instead of a silently empty
/// stream.
async fn forward_sse<S, B, E>(mut byte_stream: S, tx: tokio::sync::mpsc::UnboundedSender<String>)
where
    S: futures_util::Stream<Item = Result<B, E>> + Unpin,
    B: AsRef<[u8]>,
    E: std::fmt::Display,
{
    let mut line_buffer = String::new();
    let mut delivered = false;

    'read: while let Some(chunk_result) = byte_stream.next().await {
        let bytes = match chunk_result {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("gemini: stream interrupted: {}", e);
                let _ = tx.send(
                    ProviderError::Stream(e.to_string())
                        .user_message()
                        .to_string(),
                );
                return;
            }
        };

        line_buffer.push_str(&String::from_utf8_lossy(bytes.as_ref()));

        // Process complete SSE events
        while let Some(event_end) = line_buffer.find("\n\n") {
            let event = line_buffer[..event_end].to_string();
            line_buffer = line_buffer[event_end + 2..].to_string();

            let Some(data) = event_data(&event) else {
                continue;
            };
            if data == "[DONE]" {
                break 'read;
            }
            if let Ok(chunk) = serde_json::from_str::<Value>(data) {
                let text = extract_text(&chunk);
                if !text.is_empty() {
                    if tx.send(text).is_err() {
                        return;
                    }
                    delivered = true;
                }
            }
        }
    }

    if !delivered {
        warn!("gemini: response produced no text");
        let _ = tx.send(
            crate::provider::error::GENERIC_ERROR_MESSAGE.to_string(),
        );
    }
}

#[async_trait::async_trait]
impl TextProvider for GeminiProvider {
    async fn stream(&self, prompt: &str, system_instruction: Option<&str>) -> FragmentStream {
        if self.api_key.trim().is_empty() {
            warn!("gemini: called without a credential");
            return single_fragment(ProviderError::InvalidCredential.user_message());
        }

        let url = self.endpoint();
        debug!(model = %self.model, "gemini: POST {}", url);

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .header("Accept", "text/event-stream")
            .json(&Self::request_body(prompt, system_instruction))
            .send()
            .await;

        let response = match response {
            Ok(response) => response,
            Err(e) => {
                warn!("gemini: request failed: {}", e);
                return single_fragment(ProviderError::Request(e.to_string()).user_message());
            }
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let error = classify_http_error(status, &body);
            warn!("gemini: {}", error);
            return single_fragment(error.user_message());
        }

        // Forward SSE events through a channel; the consumer sees plain
        // text fragments and a mid-stream failure becomes one final error
        // fragment rather than a truncated silent end.
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        let byte_stream = Box::pin(response.bytes_stream());

        tokio::spawn(forward_sse(byte_stream, tx));

        Box::pin(futures_util::stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|fragment| (fragment, rx))
        }))
    }

    fn provider_name(&self) -> &str {
        "gemini"
    }
}
