//! Results reveal controller.
//!
//! Runs the two-phase timed unveiling of an already-stored result: a fixed
//! pre-reveal delay, then the reveal animation window. Purely a timing
//! contract — the controller never computes or fetches a result, it only
//! reads the one the flow already persisted.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, info_span, Instrument};

use sm_core::flow::{FlowSignal, RevealPhase};
use sm_core::ports::{FlowSignalPort, ProgressStorePort};
use sm_core::quiz::QuizResult;

#[derive(Debug, thiserror::Error)]
pub enum RevealError {
    /// No stored result exists; the reveal must not be invoked before the
    /// flow has computed and persisted one.
    #[error("no stored quiz result to reveal")]
    NotReady,
}

/// Handle to a running reveal sequence.
///
/// Dropping the handle does not stop the sequence; `cancel` does.
/// Cancellation abandons the timers only — stored state is untouched and a
/// new sequence can start from "ready to reveal" at any time.
pub struct RevealHandle {
    task: JoinHandle<()>,
}

impl RevealHandle {
    pub fn cancel(&self) {
        self.task.abort();
    }

    /// Wait for the sequence to finish (test and shutdown helper).
    pub async fn join(self) {
        let _ = self.task.await;
    }
}

pub struct RevealController {
    store: Arc<dyn ProgressStorePort>,
    signals: Arc<dyn FlowSignalPort>,
    reveal_delay: Duration,
    animation_duration: Duration,
}

impl RevealController {
    pub fn new(
        store: Arc<dyn ProgressStorePort>,
        signals: Arc<dyn FlowSignalPort>,
        reveal_delay: Duration,
        animation_duration: Duration,
    ) -> Self {
        Self {
            store,
            signals,
            reveal_delay,
            animation_duration,
        }
    }

    /// Start the sequence for the stored result.
    pub async fn begin(&self) -> Result<RevealHandle, RevealError> {
        let pending = self.store.load_result().await.ok_or(RevealError::NotReady)?;
        Ok(self.begin_with(pending.result))
    }

    /// Start the sequence for a result the caller already holds.
    pub fn begin_with(&self, result: QuizResult) -> RevealHandle {
        let signals = Arc::clone(&self.signals);
        let reveal_delay = self.reveal_delay;
        let animation_duration = self.animation_duration;

        let task = tokio::spawn(
            async move {
                signals.emit(FlowSignal::Reveal(RevealPhase::Waiting)).await;
                sleep(reveal_delay).await;

                debug!(score = result.score, "revealing quiz result");
                signals
                    .emit(FlowSignal::Reveal(RevealPhase::Revealing { result }))
                    .await;
                sleep(animation_duration).await;

                signals.emit(FlowSignal::Reveal(RevealPhase::Done)).await;
            }
            .instrument(info_span!("flow.reveal")),
        );

        RevealHandle { task }
    }
}
