use std::sync::Arc;

use tokio::sync::Mutex;

use sm_core::flow::FlowState;

/// Shared flow context containing state and dispatch lock.
///
/// Shared between `FlowOrchestrator` and anything that needs a consistent
/// read of the current flow state.
///
/// ## Lock ordering
/// When acquiring both locks, acquire `dispatch_lock` first, then `state`.
/// - `dispatch_lock`: serializes dispatch calls so the whole
///   transition + action execution + persistence runs as one unit. This is
///   what makes the store single-writer with ordered writes.
/// - `state`: guards reads (`state()`) and the write at the end of dispatch.
#[derive(Clone)]
pub struct FlowContext {
    state: Arc<Mutex<FlowState>>,
    dispatch_lock: Arc<Mutex<()>>,
}

impl FlowContext {
    pub fn new(initial_state: FlowState) -> Self {
        Self {
            state: Arc::new(Mutex::new(initial_state)),
            dispatch_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn idle() -> Self {
        Self::new(FlowState::Idle)
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// Lightweight read of the current state; does NOT take `dispatch_lock`.
    pub async fn state(&self) -> FlowState {
        self.state.lock().await.clone()
    }

    /// Acquires the dispatch lock for serializing concurrent dispatch calls.
    pub async fn acquire_dispatch_lock(&self) -> tokio::sync::MutexGuard<'_, ()> {
        self.dispatch_lock.lock().await
    }

    /// Updates the state. Only call with `dispatch_lock` held.
    pub async fn set_state(&self, state: FlowState) {
        let mut guard = self.state.lock().await;
        *guard = state;
    }
}
