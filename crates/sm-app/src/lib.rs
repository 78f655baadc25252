//! # sm-app
//!
//! Use cases for Stillmind: the quiz flow orchestrator, the timed results
//! reveal, and the mood capture lifecycle. Everything here talks to the
//! outside world exclusively through the ports defined in `sm-core`.

pub mod flow;
pub mod mood;
pub mod reveal;

pub use flow::{FlowContext, FlowError, FlowOrchestrator};
pub use mood::{CaptureMood, MoodError};
pub use reveal::{RevealController, RevealError, RevealHandle};
