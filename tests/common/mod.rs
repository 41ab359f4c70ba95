//! Shared utilities for integration tests.
//!
//! Builds coordinators over the public channel and history types.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use agent_fanout::channel::{LoopbackChannel, PackageAgent};
use agent_fanout::fanout::{
    AggregateReport, Coordinator, Finalizer, HistoryFinalizer, TaskId, TaskKind, TaskOptions,
};
use agent_fanout::history::InMemoryHistory;
use agent_fanout::{Payload, Target};

/// Upper bound on any wait in these tests.
pub const WAIT_LIMIT: Duration = Duration::from_secs(5);

/// Finalizer that records every call it receives.
#[derive(Default)]
pub struct TallyFinalizer {
    calls: AtomicUsize,
    seen: Mutex<Vec<(TaskId, TaskKind, Arc<AggregateReport>)>>,
}

impl TallyFinalizer {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub async fn seen(&self) -> Vec<(TaskId, TaskKind, Arc<AggregateReport>)> {
        self.seen.lock().await.clone()
    }
}

#[async_trait]
impl Finalizer for TallyFinalizer {
    async fn finalize(&self, task_id: TaskId, kind: &TaskKind, report: Arc<AggregateReport>) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().await.push((task_id, kind.clone(), report));
    }
}

/// Coordinator over loopback agents that record into `history`.
pub fn loopback_coordinator(
    unreachable: &[&str],
    history: Arc<InMemoryHistory>,
) -> Coordinator {
    let agent = PackageAgent::with_unreachable(unreachable.iter().map(|id| Target::new(*id)));
    Coordinator::new(
        Arc::new(LoopbackChannel::new(
            Arc::new(agent),
            Duration::from_millis(2),
        )),
        Arc::new(HistoryFinalizer::new(history)),
        TaskOptions::default(),
    )
}

/// One `(target, payload)` pair per id, all installing `package`.
pub fn targets(ids: &[&str], package: &str) -> Vec<(Target, Payload)> {
    ids.iter()
        .map(|id| (Target::new(*id), Payload::new([package])))
        .collect()
}
