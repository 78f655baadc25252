//! File-based mood journal.
//!
//! One JSON file holding the entry list. Small enough that read-modify-write
//! with the same tmp + rename discipline as the flow records is fine; a
//! per-store mutex serializes the writers.

use std::path::PathBuf;

use async_trait::async_trait;
use chrono::Utc;
use tokio::fs;
use tokio::sync::Mutex;

use sm_core::mood::{MoodEntry, MoodEntryId, NewMoodEntry};
use sm_core::ports::MoodEntryPort;

pub const MOOD_JOURNAL_FILE: &str = "mood_journal.json";

pub struct FileMoodStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileMoodStore {
    pub fn new(base_dir: PathBuf) -> Self {
        Self {
            path: base_dir.join(MOOD_JOURNAL_FILE),
            write_lock: Mutex::new(()),
        }
    }

    async fn load_entries(&self) -> anyhow::Result<Vec<MoodEntry>> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&content)?)
    }

    async fn store_entries(&self, entries: &[MoodEntry]) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_string_pretty(entries)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json.as_bytes()).await?;
        fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl MoodEntryPort for FileMoodStore {
    async fn create(&self, entry: NewMoodEntry) -> anyhow::Result<MoodEntryId> {
        let _guard = self.write_lock.lock().await;
        let mut entries = self.load_entries().await?;

        let entry = MoodEntry::from_new(entry, Utc::now());
        let id = entry.id;
        entries.push(entry);
        self.store_entries(&entries).await?;
        Ok(id)
    }

    async fn get(&self, id: MoodEntryId) -> anyhow::Result<Option<MoodEntry>> {
        let entries = self.load_entries().await?;
        Ok(entries.into_iter().find(|e| e.id == id))
    }

    async fn set_suggestion_accepted(
        &self,
        id: MoodEntryId,
        accepted: bool,
    ) -> anyhow::Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut entries = self.load_entries().await?;

        let entry = entries
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| anyhow::anyhow!("mood entry {id} not found"))?;
        entry.suggestion_accepted = Some(accepted);
        self.store_entries(&entries).await?;
        Ok(())
    }
}
