//! Mood capture use cases.
//!
//! Two-step lifecycle: create an entry when the capture screen completes,
//! then record exactly once whether the suggested activity was accepted.
//! No gating, no state machine — this is the simple sibling of the quiz flow.

use std::sync::Arc;

use tracing::debug;

use sm_core::mood::{MoodEntryId, MoodValidationError, NewMoodEntry};
use sm_core::ports::MoodEntryPort;

#[derive(Debug, thiserror::Error)]
pub enum MoodError {
    #[error(transparent)]
    Validation(#[from] MoodValidationError),

    #[error("mood entry {0} not found")]
    NotFound(MoodEntryId),

    /// The suggestion outcome was already recorded; entries are immutable
    /// after their one follow-up update.
    #[error("suggestion outcome already recorded for {0}")]
    AlreadyResolved(MoodEntryId),

    #[error("mood store failed: {0}")]
    Store(#[from] anyhow::Error),
}

/// Use case for the mood capture screens.
pub struct CaptureMood {
    entries: Arc<dyn MoodEntryPort>,
}

impl CaptureMood {
    pub fn new(entries: Arc<dyn MoodEntryPort>) -> Self {
        Self { entries }
    }

    /// Create a mood entry from the first capture step.
    pub async fn record(&self, new: NewMoodEntry) -> Result<MoodEntryId, MoodError> {
        new.validate()?;
        let id = self.entries.create(new).await?;
        debug!(entry = %id, "mood entry recorded");
        Ok(id)
    }

    /// Record whether the suggested activity was accepted. One-shot: a
    /// second call for the same entry fails with `AlreadyResolved`.
    pub async fn record_suggestion_outcome(
        &self,
        id: MoodEntryId,
        accepted: bool,
    ) -> Result<(), MoodError> {
        let entry = self
            .entries
            .get(id)
            .await?
            .ok_or(MoodError::NotFound(id))?;
        if entry.is_resolved() {
            return Err(MoodError::AlreadyResolved(id));
        }
        self.entries.set_suggestion_accepted(id, accepted).await?;
        Ok(())
    }
}
