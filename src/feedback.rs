//! Per-run feedback persisted as JSON files.
//!
//! Each run's feedback lives in its own file under the store directory,
//! keyed by run id. Saving overwrites any previous feedback for the run.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Thumbs rating attached to a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rating {
    /// Positive rating.
    Up,
    /// Negative rating.
    Down,
}

/// Feedback captured for one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunFeedback {
    /// Optional thumbs rating.
    pub rating: Option<Rating>,
    /// Free-text comment, possibly empty.
    pub text: String,
    /// When the feedback was recorded.
    pub timestamp: DateTime<Utc>,
}

impl RunFeedback {
    /// Create feedback stamped with the current time.
    pub fn new(rating: Option<Rating>, text: impl Into<String>) -> Self {
        Self {
            rating,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Keep run ids filesystem-safe.
fn sanitize_run_id(run_id: &str) -> String {
    run_id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// File-backed store of per-run feedback.
#[derive(Debug, Clone)]
pub struct FeedbackStore {
    dir: PathBuf,
}

impl FeedbackStore {
    /// Open a store at `dir`, defaulting to `~/.cck/feedback`.
    ///
    /// Creates the directory if it does not exist.
    pub fn new(dir: Option<&Path>) -> Result<Self> {
        let dir = match dir {
            Some(dir) => dir.to_path_buf(),
            None => dirs::home_dir()
                .context("Failed to determine home directory")?
                .join(".cck")
                .join("feedback"),
        };
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create feedback directory: {}", dir.display()))?;
        Ok(Self { dir })
    }

    fn path_for(&self, run_id: &str) -> PathBuf {
        self.dir
            .join(format!("feedback-{}.json", sanitize_run_id(run_id)))
    }

    /// Save feedback for a run, replacing any existing record.
    pub fn save(&self, run_id: &str, feedback: &RunFeedback) -> Result<()> {
        let path = self.path_for(run_id);
        let json = serde_json::to_string_pretty(feedback)
            .context("Failed to serialize feedback")?;
        fs::write(&path, json)
            .with_context(|| format!("Failed to write feedback file: {}", path.display()))?;
        debug!(run_id, path = %path.display(), "feedback saved");
        Ok(())
    }

    /// Load feedback for a run, if any was saved.
    pub fn load(&self, run_id: &str) -> Result<Option<RunFeedback>> {
        let path = self.path_for(run_id);
        if !path.exists() {
            return Ok(None);
        }
        let json = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read feedback file: {}", path.display()))?;
        let feedback = serde_json::from_str(&json)
            .with_context(|| format!("Failed to parse feedback file: {}", path.display()))?;
        Ok(Some(feedback))
    }

    /// Delete feedback for a run. Deleting a missing record is not an error.
    pub fn delete(&self, run_id: &str) -> Result<()> {
        let path = self.path_for(run_id);
        if path.exists() {
            fs::remove_file(&path)
                .with_context(|| format!("Failed to delete feedback file: {}", path.display()))?;
        }
        Ok(())
    }
}
