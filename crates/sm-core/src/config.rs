//! Flow configuration domain model

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the quiz onboarding flow.
///
/// This is the subset of application settings the flow layer needs;
/// presentation settings (themes, typography, copy) live elsewhere.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowConfig {
    /// Quiz shape and validation thresholds
    pub quiz: QuizRules,

    /// Delay before the reveal sequence starts, in milliseconds
    pub reveal_delay_ms: u64,

    /// Duration of the reveal animation, in milliseconds
    pub animation_duration_ms: u64,

    /// Upper bound on the account reconciliation lookup, in milliseconds
    pub lookup_timeout_ms: u64,

    /// Retry policy for the final remote result upload
    pub sync_retry: SyncRetryConfig,
}

/// Quiz shape and validation thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizRules {
    /// Number of questions presented by the quiz
    pub total_questions: usize,

    /// Minimum answers required before scoring is allowed
    pub min_questions: usize,
}

/// Retry policy for the remote result upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncRetryConfig {
    /// Maximum attempts before the upload is abandoned
    pub max_attempts: u32,

    /// Base backoff between attempts, in milliseconds (grows linearly per attempt)
    pub backoff_ms: u64,
}

impl FlowConfig {
    pub fn reveal_delay(&self) -> Duration {
        Duration::from_millis(self.reveal_delay_ms)
    }

    pub fn animation_duration(&self) -> Duration {
        Duration::from_millis(self.animation_duration_ms)
    }

    pub fn lookup_timeout(&self) -> Duration {
        Duration::from_millis(self.lookup_timeout_ms)
    }
}

impl SyncRetryConfig {
    pub fn backoff(&self) -> Duration {
        Duration::from_millis(self.backoff_ms)
    }
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            quiz: QuizRules::default(),
            reveal_delay_ms: 2000,
            animation_duration_ms: 1500,
            lookup_timeout_ms: 5000,
            sync_retry: SyncRetryConfig::default(),
        }
    }
}

impl Default for QuizRules {
    fn default() -> Self {
        Self {
            total_questions: 10,
            min_questions: 10,
        }
    }
}

impl Default for SyncRetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_ms: 500,
        }
    }
}
