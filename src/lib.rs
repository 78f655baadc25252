//! Stillmind application shell.
//!
//! Wires the flow use cases to their file and HTTP adapters. The domain
//! logic lives in `sm-core`, the use cases in `sm-app`, the adapters in
//! `sm-infra`; this crate only assembles them.

pub mod builder;
pub mod logging;

pub use builder::{AppBuilder, Stillmind};

// Re-export the surface a UI shell talks to.
pub use sm_app::{CaptureMood, FlowError, FlowOrchestrator, MoodError};
pub use sm_core::{FlowConfig, FlowSignal, QuizAnswer, RevealPhase, ScreenDestination};
