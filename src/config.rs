//! Environment variable loading and management.
//!
//! The core has no file configuration of its own; the only external inputs
//! are the backend credential and an optional model override.

use std::env;
use std::path::Path;

/// Loads environment variables from a .env file and the system environment.
#[derive(Debug, Clone)]
pub struct EnvironmentLoader {
    #[allow(dead_code)]
    env_file: Option<String>,
}

impl EnvironmentLoader {
    /// Initialize the environment loader.
    ///
    /// # Arguments
    /// * `env_file` - Path to a .env file. Only loaded when explicitly
    ///   provided, so unit tests never pick up a repository .env by accident.
    pub fn new(env_file: Option<&Path>) -> Self {
        if let Some(path) = env_file {
            if path.exists() {
                if let Err(e) = dotenv::from_path(path) {
                    eprintln!("Warning: Failed to load .env file: {}", e);
                }
            }
        }

        Self {
            env_file: env_file.map(|p| p.to_string_lossy().to_string()),
        }
    }

    /// Get the backend credential from `GEMINI_API_KEY`.
    ///
    /// Returns None when unset; gating execution on a present credential is
    /// the caller's responsibility.
    pub fn api_key(&self) -> Option<String> {
        env::var("GEMINI_API_KEY").ok().filter(|key| !key.trim().is_empty())
    }

    /// Get the model selection from `CCK_MODEL`, falling back to the default.
    pub fn model(&self) -> String {
        env::var("CCK_MODEL").unwrap_or_else(|_| crate::provider::gemini::DEFAULT_MODEL.to_string())
    }
}

impl Default for EnvironmentLoader {
    fn default() -> Self {
        Self::new(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_falls_back_to_default() {
        env::remove_var("CCK_MODEL");
        let loader = EnvironmentLoader::default();
        assert_eq!(loader.model(), "gemini-2.5-flash");

        env::set_var("CCK_MODEL", "gemini-2.0-pro");
        let loader = EnvironmentLoader::default();
        assert_eq!(loader.model(), "gemini-2.0-pro");

        env::remove_var("CCK_MODEL");
    }

    #[test]
    fn blank_api_key_counts_as_missing() {
        env::set_var("GEMINI_API_KEY", "   ");
        let loader = EnvironmentLoader::default();
        assert_eq!(loader.api_key(), None);
        env::remove_var("GEMINI_API_KEY");
    }
}
