//! Queue-backed invocation channel.
//!
//! `invoke` mints a correlation id, queues an `OutboundCall` and returns.
//! Whatever drains the queue (a message-bus adapter, the loopback agents)
//! delivers the call and later answers through the call's `ReplyHandle`.
//! The handle is consumed by answering, so one call gets at most one reply.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::fanout::{CorrelationId, InvocationResult, Payload, RemoteFailure, Target};
use crate::interfaces::channel::Result;
use crate::interfaces::{ChannelError, InvocationChannel, ReplySink};

/// Single-use reply path for one call.
pub struct ReplyHandle {
    correlation_id: CorrelationId,
    sink: Arc<dyn ReplySink>,
}

impl ReplyHandle {
    pub fn correlation_id(&self) -> &CorrelationId {
        &self.correlation_id
    }

    pub async fn succeed(self, result: InvocationResult) {
        self.sink.on_success(self.correlation_id, result).await;
    }

    pub async fn fail(self, failure: RemoteFailure) {
        self.sink.on_failure(self.correlation_id, failure).await;
    }
}

/// A call waiting to be delivered to its agent.
pub struct OutboundCall {
    pub target: Target,
    pub method: String,
    pub payload: Payload,
    pub reply: ReplyHandle,
}

/// Channel that queues calls for a transport pump.
#[derive(Clone)]
pub struct QueuedChannel {
    sender: mpsc::UnboundedSender<OutboundCall>,
}

impl QueuedChannel {
    /// Create the channel and the receiving end for the pump.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<OutboundCall>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

#[async_trait]
impl InvocationChannel for QueuedChannel {
    async fn invoke(
        &self,
        target: &Target,
        method: &str,
        payload: &Payload,
        sink: Arc<dyn ReplySink>,
    ) -> Result<CorrelationId> {
        let correlation_id = CorrelationId::generate();
        let call = OutboundCall {
            target: target.clone(),
            method: method.to_string(),
            payload: payload.clone(),
            reply: ReplyHandle {
                correlation_id: correlation_id.clone(),
                sink,
            },
        };

        if self.sender.send(call).is_err() {
            warn!(%target, "Outbound queue closed");
            return Err(ChannelError::Closed);
        }

        debug!(%target, %method, %correlation_id, "Call queued");
        Ok(correlation_id)
    }
}
