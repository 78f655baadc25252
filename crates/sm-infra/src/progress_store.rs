//! File-based progress store
//!
//! Persists the two flow records — in-flight progress and the pending
//! result — as separate JSON files in the application data directory.
//! Writes go through a temp file plus rename so a crash mid-write never
//! leaves a partial record; anything unreadable loads as `None`, because
//! the flow treats corruption as "no progress".

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::warn;

use sm_core::ports::ProgressStorePort;
use sm_core::quiz::{PendingResult, QuizProgress};

pub const PROGRESS_FILE: &str = "quiz_progress.json";
pub const PENDING_RESULT_FILE: &str = "quiz_pending_results.json";

pub struct FileProgressStore {
    base_dir: PathBuf,
}

impl FileProgressStore {
    pub fn new(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    fn progress_path(&self) -> PathBuf {
        self.base_dir.join(PROGRESS_FILE)
    }

    fn result_path(&self) -> PathBuf {
        self.base_dir.join(PENDING_RESULT_FILE)
    }

    async fn write_record<T: Serialize>(&self, path: &Path, record: &T) -> anyhow::Result<()> {
        fs::create_dir_all(&self.base_dir).await?;

        let json = serde_json::to_string_pretty(record)?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json.as_bytes()).await?;
        // Atomic on the same filesystem; readers see either the old record
        // or the new one, never a torn write.
        fs::rename(&tmp, path).await?;
        Ok(())
    }

    async fn read_record<T: DeserializeOwned>(path: &Path) -> Option<T> {
        let content = match fs::read_to_string(path).await {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return None,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "unreadable flow record, treating as absent");
                return None;
            }
        };
        if content.trim().is_empty() {
            return None;
        }
        match serde_json::from_str(&content) {
            Ok(record) => Some(record),
            Err(err) => {
                warn!(path = %path.display(), error = %err, "corrupt flow record, treating as absent");
                None
            }
        }
    }

    async fn remove_if_exists(path: &Path) -> anyhow::Result<()> {
        match fs::remove_file(path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

#[async_trait]
impl ProgressStorePort for FileProgressStore {
    async fn load_progress(&self) -> Option<QuizProgress> {
        Self::read_record(&self.progress_path()).await
    }

    async fn save_progress(&self, progress: &QuizProgress) -> anyhow::Result<()> {
        self.write_record(&self.progress_path(), progress).await
    }

    async fn load_result(&self) -> Option<PendingResult> {
        Self::read_record(&self.result_path()).await
    }

    async fn save_result(&self, pending: &PendingResult) -> anyhow::Result<()> {
        self.write_record(&self.result_path(), pending).await
    }

    async fn clear_all(&self) -> anyhow::Result<()> {
        Self::remove_if_exists(&self.progress_path()).await?;
        Self::remove_if_exists(&self.result_path()).await?;
        Ok(())
    }
}
