//! Provider error taxonomy.
//!
//! Backend failures never surface as `Err` through the streaming contract;
//! they are mapped to a single user-visible fragment via
//! [`ProviderError::user_message`] so every call yields displayable text.

use thiserror::Error;

/// User-visible fragment substituted for output on a generic backend failure.
pub const GENERIC_ERROR_MESSAGE: &str =
    "An error occurred while generating the response. Please try again.";

/// User-visible fragment substituted for output when the credential is
/// rejected. Kept distinct so callers can show an actionable message.
pub const INVALID_CREDENTIAL_MESSAGE: &str =
    "The API key is invalid or missing. Please provide a valid API key and try again.";

/// Failure modes of the streaming text backend.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The backend rejected the supplied credential.
    #[error("invalid or missing API credential")]
    InvalidCredential,

    /// The request could not be sent or was rejected.
    #[error("request failed: {0}")]
    Request(String),

    /// The stream ended abnormally after it started.
    #[error("stream interrupted: {0}")]
    Stream(String),
}

impl ProviderError {
    /// The fixed human-readable fragment shown in place of normal output.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::InvalidCredential => INVALID_CREDENTIAL_MESSAGE,
            Self::Request(_) | Self::Stream(_) => GENERIC_ERROR_MESSAGE,
        }
    }
}
