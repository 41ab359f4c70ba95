//! In-process loopback channel.
//!
//! Calls are answered by a `LocalAgent` running inside this process. Each
//! call is answered on its own tokio task, so replies arrive concurrently
//! and in no particular order, the way they do from a real agent fleet.
//! Used by standalone mode and by tests.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

use super::queued::{OutboundCall, QueuedChannel};
use crate::fanout::{CorrelationId, InvocationResult, Payload, RemoteFailure, Target};
use crate::interfaces::channel::Result;
use crate::interfaces::{InvocationChannel, ReplySink};

/// Loopback channel configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoopbackConfig {
    /// Consumers whose agent never answers successfully.
    pub unreachable: Vec<String>,
    /// Delay before each reply, in milliseconds.
    pub reply_delay_ms: u64,
}

/// An agent answering calls in-process.
#[async_trait]
pub trait LocalAgent: Send + Sync {
    async fn call(
        &self,
        target: &Target,
        method: &str,
        payload: &Payload,
    ) -> std::result::Result<InvocationResult, RemoteFailure>;
}

/// Simulated package agent.
///
/// Reports every requested package as installed, except on unreachable
/// targets, which fail with "agent unreachable".
#[derive(Debug, Default)]
pub struct PackageAgent {
    unreachable: HashSet<Target>,
}

impl PackageAgent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_unreachable<I>(targets: I) -> Self
    where
        I: IntoIterator<Item = Target>,
    {
        Self {
            unreachable: targets.into_iter().collect(),
        }
    }
}

#[async_trait]
impl LocalAgent for PackageAgent {
    async fn call(
        &self,
        target: &Target,
        method: &str,
        payload: &Payload,
    ) -> std::result::Result<InvocationResult, RemoteFailure> {
        if self.unreachable.contains(target) {
            return Err(RemoteFailure::new("agent unreachable"));
        }
        debug!(%target, %method, packages = ?payload.packages(), "Agent handled call");
        Ok(json!({
            "method": method,
            "installed": payload.packages(),
        }))
    }
}

/// Channel whose calls are answered by a `LocalAgent`.
pub struct LoopbackChannel {
    queue: QueuedChannel,
}

impl LoopbackChannel {
    /// Create the channel and start its pump.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(agent: Arc<dyn LocalAgent>, reply_delay: Duration) -> Self {
        let (queue, mut calls) = QueuedChannel::new();

        tokio::spawn(async move {
            while let Some(call) = calls.recv().await {
                tokio::spawn(answer(Arc::clone(&agent), call, reply_delay));
            }
            debug!("Loopback pump stopped");
        });

        info!(?reply_delay, "Loopback channel started");
        Self { queue }
    }

    pub fn from_config(config: &LoopbackConfig) -> Self {
        let agent = PackageAgent::with_unreachable(
            config.unreachable.iter().map(|id| Target::new(id.as_str())),
        );
        Self::new(Arc::new(agent), Duration::from_millis(config.reply_delay_ms))
    }
}

async fn answer(agent: Arc<dyn LocalAgent>, call: OutboundCall, reply_delay: Duration) {
    if !reply_delay.is_zero() {
        tokio::time::sleep(reply_delay).await;
    }
    match agent.call(&call.target, &call.method, &call.payload).await {
        Ok(result) => call.reply.succeed(result).await,
        Err(failure) => call.reply.fail(failure).await,
    }
}

#[async_trait]
impl InvocationChannel for LoopbackChannel {
    async fn invoke(
        &self,
        target: &Target,
        method: &str,
        payload: &Payload,
        sink: Arc<dyn ReplySink>,
    ) -> Result<CorrelationId> {
        self.queue.invoke(target, method, payload, sink).await
    }
}
