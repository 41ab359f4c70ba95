//! Remote invocation channel interface.

use std::sync::Arc;

use async_trait::async_trait;

use crate::fanout::{CorrelationId, InvocationResult, Payload, RemoteFailure, Target};

/// Result type for channel operations.
pub type Result<T> = std::result::Result<T, ChannelError>;

/// Errors raised synchronously by a channel while issuing a call.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum ChannelError {
    #[error("Agent unreachable: {0}")]
    Unreachable(String),

    #[error("Channel closed")]
    Closed,

    #[error("Transport error: {0}")]
    Transport(String),
}

impl From<ChannelError> for RemoteFailure {
    fn from(err: ChannelError) -> Self {
        RemoteFailure::new(err.to_string())
    }
}

/// Receiver of asynchronous replies.
///
/// Exactly one of `on_success`/`on_failure` is delivered per correlation id,
/// or none at all. Calls for different ids may arrive concurrently and in
/// any order.
#[async_trait]
pub trait ReplySink: Send + Sync {
    /// The call identified by `id` completed.
    async fn on_success(&self, id: CorrelationId, result: InvocationResult);

    /// The call identified by `id` failed on the agent side.
    async fn on_failure(&self, id: CorrelationId, failure: RemoteFailure);
}

/// Transport that delivers calls to agents.
///
/// `invoke` returns as soon as the call is issued. The reply is delivered
/// later to `sink`, never from inside `invoke` itself: callers may hold
/// state that the sink also needs while `invoke` is running.
///
/// Implementations:
/// - `QueuedChannel`: hands calls to an external transport pump
/// - `LoopbackChannel`: in-process agents
#[async_trait]
pub trait InvocationChannel: Send + Sync {
    async fn invoke(
        &self,
        target: &Target,
        method: &str,
        payload: &Payload,
        sink: Arc<dyn ReplySink>,
    ) -> Result<CorrelationId>;
}
