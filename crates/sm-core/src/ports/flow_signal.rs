//! Flow signal port

use async_trait::async_trait;

use crate::flow::FlowSignal;

/// Outbound channel towards presentation and observability.
///
/// Emission is fire-and-forget from the flow's point of view; a slow or
/// absent observer must never stall a transition.
#[async_trait]
pub trait FlowSignalPort: Send + Sync {
    async fn emit(&self, signal: FlowSignal);
}
