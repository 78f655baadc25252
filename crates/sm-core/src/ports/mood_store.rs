//! Mood entry store port

use async_trait::async_trait;

use crate::mood::{MoodEntry, MoodEntryId, NewMoodEntry};

#[async_trait]
pub trait MoodEntryPort: Send + Sync {
    /// Persist a new entry and return its id.
    async fn create(&self, entry: NewMoodEntry) -> anyhow::Result<MoodEntryId>;

    /// Fetch an entry by id.
    async fn get(&self, id: MoodEntryId) -> anyhow::Result<Option<MoodEntry>>;

    /// Record whether the suggested activity was accepted.
    ///
    /// Implementations only write the flag; the one-shot rule (no second
    /// update) is enforced by the use case layer.
    async fn set_suggestion_accepted(&self, id: MoodEntryId, accepted: bool)
        -> anyhow::Result<()>;
}
