//! Test utilities and mock implementations.
//!
//! Mock collaborators for exercising the coordinator without a transport.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::fanout::{
    AggregateReport, CorrelationId, Finalizer, Payload, Target, TaskId, TaskKind,
};
use crate::interfaces::channel::Result as ChannelResult;
use crate::interfaces::{ChannelError, InvocationChannel, ReplySink};

/// A call captured by `RecordingChannel`.
#[derive(Clone)]
pub struct RecordedCall {
    pub id: CorrelationId,
    pub target: Target,
    pub method: String,
    pub payload: Payload,
    pub sink: Arc<dyn ReplySink>,
}

/// Channel that records calls and never replies on its own.
///
/// Tests deliver replies through the recorded sink.
#[derive(Default)]
pub struct RecordingChannel {
    calls: RwLock<Vec<RecordedCall>>,
    rejected: RwLock<HashSet<Target>>,
    fixed_id: Option<CorrelationId>,
}

impl RecordingChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the same correlation id for every call.
    pub fn with_fixed_id(id: CorrelationId) -> Self {
        Self {
            fixed_id: Some(id),
            ..Self::default()
        }
    }

    /// Reject calls to `target` at invoke time.
    pub async fn reject(&self, target: Target) {
        self.rejected.write().await.insert(target);
    }

    pub async fn calls(&self) -> Vec<RecordedCall> {
        self.calls.read().await.clone()
    }
}

#[async_trait]
impl InvocationChannel for RecordingChannel {
    async fn invoke(
        &self,
        target: &Target,
        method: &str,
        payload: &Payload,
        sink: Arc<dyn ReplySink>,
    ) -> ChannelResult<CorrelationId> {
        if self.rejected.read().await.contains(target) {
            return Err(ChannelError::Unreachable(target.to_string()));
        }

        let id = self
            .fixed_id
            .clone()
            .unwrap_or_else(CorrelationId::generate);
        self.calls.write().await.push(RecordedCall {
            id: id.clone(),
            target: target.clone(),
            method: method.to_string(),
            payload: payload.clone(),
            sink,
        });
        Ok(id)
    }
}

/// Finalizer that counts invocations and keeps every report.
#[derive(Default)]
pub struct CountingFinalizer {
    count: AtomicUsize,
    reports: RwLock<Vec<(TaskKind, Arc<AggregateReport>)>>,
}

impl CountingFinalizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }

    pub async fn last_report(&self) -> Option<(TaskKind, Arc<AggregateReport>)> {
        self.reports.read().await.last().cloned()
    }
}

#[async_trait]
impl Finalizer for CountingFinalizer {
    async fn finalize(&self, _task_id: TaskId, kind: &TaskKind, report: Arc<AggregateReport>) {
        self.count.fetch_add(1, Ordering::SeqCst);
        self.reports.write().await.push((kind.clone(), report));
    }
}
