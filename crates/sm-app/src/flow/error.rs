use sm_core::quiz::ScoringError;

/// Errors surfaced by the flow orchestrator.
///
/// Local store write failures are absorbed (logged, retried on the next
/// write) and remote upload failures are escalated through the signal port,
/// so neither appears here.
#[derive(Debug, thiserror::Error)]
pub enum FlowError {
    /// Quiz submitted below the minimum question count. Recoverable; the
    /// same rejection is also visible on the `InProgress` state for the UI.
    #[error("quiz submitted with {answered} answers, {required} required")]
    Validation { answered: usize, required: usize },

    #[error("scoring failed: {0}")]
    Scoring(#[from] ScoringError),

    /// Reveal requested while no unlocked result exists.
    #[error("results are not ready to reveal")]
    NotReady,
}
