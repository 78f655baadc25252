//! Mood capture domain models
//!
//! Mood entries follow a simpler create-then-update lifecycle than the quiz
//! flow: an entry is created when the capture step completes, updated once
//! when the user tells us whether the suggested activity was accepted, and
//! immutable afterwards.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

pub const MIN_INTENSITY: u8 = 1;
pub const MAX_INTENSITY: u8 = 10;

/// Identifier of a stored mood entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MoodEntryId(pub Uuid);

impl MoodEntryId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for MoodEntryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// The closed set of mood types the capture screen offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoodKind {
    Calm,
    Happy,
    Anxious,
    Sad,
    Angry,
    Overwhelmed,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoodValidationError {
    #[error("intensity {0} outside {MIN_INTENSITY}..={MAX_INTENSITY}")]
    IntensityOutOfRange(u8),
}

/// Input for creating a mood entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMoodEntry {
    pub kind: MoodKind,
    /// Bounded 1..=10, validated by [`NewMoodEntry::validate`].
    pub intensity: u8,
    pub content: String,
    /// Slug of the activity suggested for this mood, if any.
    pub suggested_activity: Option<String>,
}

impl NewMoodEntry {
    pub fn validate(&self) -> Result<(), MoodValidationError> {
        if !(MIN_INTENSITY..=MAX_INTENSITY).contains(&self.intensity) {
            return Err(MoodValidationError::IntensityOutOfRange(self.intensity));
        }
        Ok(())
    }
}

/// A stored mood entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoodEntry {
    pub id: MoodEntryId,
    pub kind: MoodKind,
    pub intensity: u8,
    pub content: String,
    pub suggested_activity: Option<String>,
    /// Unset until the follow-up step records the outcome; set at most once.
    pub suggestion_accepted: Option<bool>,
    pub recorded_at: DateTime<Utc>,
}

impl MoodEntry {
    pub fn from_new(new: NewMoodEntry, recorded_at: DateTime<Utc>) -> Self {
        Self {
            id: MoodEntryId::generate(),
            kind: new.kind,
            intensity: new.intensity,
            content: new.content,
            suggested_activity: new.suggested_activity,
            suggestion_accepted: None,
            recorded_at,
        }
    }

    /// Whether the one-shot suggestion update has already happened.
    pub fn is_resolved(&self) -> bool {
        self.suggestion_accepted.is_some()
    }
}
