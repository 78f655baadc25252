//! # sm-core
//!
//! Core domain models and business logic for Stillmind.
//!
//! This crate contains pure business logic without any infrastructure dependencies.

// Public module exports
pub mod account;
pub mod config;
pub mod flow;
pub mod mood;
pub mod ports;
pub mod quiz;

// Re-export commonly used types at the crate root
pub use account::{AccountLookup, AccountRef};
pub use config::{FlowConfig, QuizRules, SyncRetryConfig};
pub use flow::{
    FlowAction, FlowEvent, FlowRejection, FlowSignal, FlowState, FlowStateMachine, RevealPhase,
    ScreenDestination, SignupPhase,
};
pub use mood::{MoodEntry, MoodEntryId, MoodKind, NewMoodEntry};
pub use quiz::{Classification, PendingResult, QuizAnswer, QuizProgress, QuizResult, QuizStage};
