//! Quiz onboarding flow domain
//!
//! The flow is modeled as a pure state machine (`state_machine`) whose side
//! effects are expressed as actions executed by the application layer. The
//! presentation layer only ever observes derived destinations and signals.

mod destination;
mod signal;
mod state_machine;

pub use destination::ScreenDestination;
pub use signal::{FlowSignal, RevealPhase};
pub use state_machine::{FlowAction, FlowEvent, FlowRejection, FlowState, FlowStateMachine, SignupPhase};
