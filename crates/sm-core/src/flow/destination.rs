//! Logical navigation destinations.
//!
//! The flow never calls a router. It derives a destination from its state
//! and the presentation layer observes it through the signal port, keeping
//! the state machine free of any UI framework.

use serde::{Deserialize, Serialize};

use super::state_machine::{FlowState, SignupPhase};

/// The three logical screens the flow can route to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "screen", rename_all = "snake_case")]
pub enum ScreenDestination {
    /// Quiz screen, positioned after `answered` questions.
    Quiz { answered: usize },
    /// Signup screen; `existing_account` switches it to sign-in mode with
    /// an "account already exists" notice.
    Signup { existing_account: bool },
    /// Results screen; `revealed` is false while the reveal is still gated
    /// or running.
    Results { revealed: bool },
}

impl ScreenDestination {
    pub fn for_state(state: &FlowState) -> Self {
        match state {
            FlowState::Idle => ScreenDestination::Quiz { answered: 0 },
            FlowState::InProgress { answers, .. } => ScreenDestination::Quiz {
                answered: answers.len(),
            },
            FlowState::AwaitingSignup { phase, .. } => ScreenDestination::Signup {
                existing_account: matches!(phase, SignupPhase::ExistingAccount { .. }),
            },
            FlowState::ResultsUnlocked { .. } => ScreenDestination::Results { revealed: false },
            FlowState::Completed => ScreenDestination::Results { revealed: true },
        }
    }
}
