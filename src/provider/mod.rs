//! Streaming text backend abstraction.
//!
//! This module defines the provider contract the orchestrators depend on,
//! the provider error taxonomy, and the Gemini-backed implementation.

pub mod error;
pub mod gemini;
pub mod traits;

// Re-export main types
pub use error::{ProviderError, GENERIC_ERROR_MESSAGE, INVALID_CREDENTIAL_MESSAGE};
pub use gemini::GeminiProvider;
pub use traits::{collect_fragments, single_fragment, FragmentStream, TextProvider};
