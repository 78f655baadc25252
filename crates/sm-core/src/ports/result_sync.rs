//! Remote result persistence port

use async_trait::async_trait;

use crate::account::AccountRef;
use crate::quiz::QuizResult;

/// Uploads the final quiz result to the system of record.
///
/// The upsert is keyed by account reference, so a retried call after a
/// partial failure never creates a duplicate remote record. Retry policy
/// belongs to the caller.
#[async_trait]
pub trait ResultSyncPort: Send + Sync {
    async fn upsert_result(&self, account: &AccountRef, result: &QuizResult)
        -> anyhow::Result<()>;
}
