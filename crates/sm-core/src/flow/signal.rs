//! Signals emitted towards the presentation and observability layers.

use serde::{Deserialize, Serialize};

use crate::account::AccountRef;
use crate::quiz::{QuizResult, QuizStage};

use super::destination::ScreenDestination;

/// Phase of the timed reveal sequence.
///
/// `Revealing` is the first moment the computed result crosses into
/// presentation territory; nothing before it carries the result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum RevealPhase {
    /// Fixed pre-reveal delay is running.
    Waiting,
    /// Reveal animation started for this result.
    Revealing { result: QuizResult },
    /// Animation finished; waiting for acknowledgement.
    Done,
}

/// Everything the flow reports outward.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "signal", rename_all = "snake_case")]
pub enum FlowSignal {
    /// The flow moved; the presentation layer should show `destination`.
    StageChanged {
        stage: Option<QuizStage>,
        destination: ScreenDestination,
    },
    /// Progress of the reveal sequence.
    Reveal(RevealPhase),
    /// The final upload was abandoned after exhausting retries. The local
    /// flow completed anyway; the backend record needs an out-of-band
    /// backfill for this account.
    RemoteSyncAbandoned { account: AccountRef },
}
