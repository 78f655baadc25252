//! Quiz flow orchestration.

mod context;
mod error;
mod orchestrator;

pub use context::FlowContext;
pub use error::FlowError;
pub use orchestrator::FlowOrchestrator;
