//! Ports — the seams between the flow and its collaborators.
//!
//! Implementations live in the infrastructure layer (file repositories,
//! HTTP clients) or in tests (hand-rolled mocks).

mod account_lookup;
mod flow_signal;
mod mood_store;
mod progress_store;
mod result_sync;

pub use account_lookup::AccountLookupPort;
pub use flow_signal::FlowSignalPort;
pub use mood_store::MoodEntryPort;
pub use progress_store::ProgressStorePort;
pub use result_sync::ResultSyncPort;
