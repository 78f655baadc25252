//! Local progress store port
//!
//! This port defines the contract for the durable local records the flow
//! survives restarts with. Progress and the pending result are stored as
//! two separate records so clearing one never touches the other until the
//! flow truly completes.

use async_trait::async_trait;

use crate::quiz::{PendingResult, QuizProgress};

#[async_trait]
pub trait ProgressStorePort: Send + Sync {
    /// Load the in-flight quiz progress.
    ///
    /// Missing or corrupt data loads as `None` — corruption is treated as
    /// "no progress", never as an error the flow has to handle.
    async fn load_progress(&self) -> Option<QuizProgress>;

    /// Overwrite the progress record.
    ///
    /// Must be atomic with respect to process termination: a crash mid-write
    /// must never leave a partial record that `load_progress` accepts.
    async fn save_progress(&self, progress: &QuizProgress) -> anyhow::Result<()>;

    /// Load the computed-but-unrevealed result together with the answer
    /// sheet it was scored from.
    async fn load_result(&self) -> Option<PendingResult>;

    /// Overwrite the pending result record.
    async fn save_result(&self, pending: &PendingResult) -> anyhow::Result<()>;

    /// Remove both records. Idempotent; safe when nothing is stored.
    async fn clear_all(&self) -> anyhow::Result<()>;
}
