//! The fan-out task.
//!
//! A `FanOutTask` issues one call per `(target, payload)` through an
//! `InvocationChannel` and acts as the `ReplySink` for all of them. Each
//! reply runs one critical section under the task's progress lock:
//!
//! 1. resolve the correlation id (unknown ids are orphans: logged, dropped)
//! 2. record the target as succeeded or failed
//! 3. if nothing is pending any more, move to `Complete` and build the report
//!
//! Only the reply that performs the `Dispatched -> Complete` transition runs
//! the finalizer, outside the lock.

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{watch, Mutex};
use tracing::{debug, error, info, warn};

use super::coordinator::CoordinatorError;
use super::finalizer::Finalizer;
use super::kind::{TaskKind, INSTALL_METHOD};
use super::registry::CorrelationRegistry;
use super::report::{AggregateReport, TargetFailure, TargetSuccess};
use super::{CorrelationId, InvocationResult, Payload, RemoteFailure, Target, TaskId, TaskState};
use crate::interfaces::{InvocationChannel, ReplySink};

/// Per-task settings.
#[derive(Debug, Clone)]
pub struct TaskOptions {
    /// Agent method invoked on every target.
    pub method: String,
    /// Deadline for outstanding replies. `None` waits forever.
    pub reply_timeout: Option<Duration>,
}

impl Default for TaskOptions {
    fn default() -> Self {
        Self {
            method: INSTALL_METHOD.to_string(),
            reply_timeout: None,
        }
    }
}

/// Point-in-time view of a task's counters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskStatus {
    pub id: TaskId,
    pub kind: TaskKind,
    pub state: TaskState,
    pub pending: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub total: usize,
}

/// Mutable part of a task, guarded by one lock.
#[derive(Default)]
struct Progress {
    pending: CorrelationRegistry,
    succeeded: Vec<TargetSuccess>,
    failed: Vec<TargetFailure>,
}

/// Coordinator for one logical operation over many targets.
pub struct FanOutTask {
    id: TaskId,
    kind: TaskKind,
    targets: Vec<(Target, Payload)>,
    options: TaskOptions,
    channel: Arc<dyn InvocationChannel>,
    finalizer: Arc<dyn Finalizer>,
    progress: Mutex<Progress>,
    /// Written only while `progress` is locked.
    state: watch::Sender<TaskState>,
    /// Set exactly once, by the transition to `Complete`.
    report: OnceLock<Arc<AggregateReport>>,
    /// Carries the report once the finalizer has returned.
    finished: watch::Sender<Option<Arc<AggregateReport>>>,
}

impl FanOutTask {
    /// Build a task without dispatching it.
    pub fn new(
        kind: TaskKind,
        targets: Vec<(Target, Payload)>,
        channel: Arc<dyn InvocationChannel>,
        finalizer: Arc<dyn Finalizer>,
        options: TaskOptions,
    ) -> Arc<Self> {
        let (state, _) = watch::channel(TaskState::Created);
        let (finished, _) = watch::channel(None);

        Arc::new(Self {
            id: TaskId::generate(),
            kind,
            targets,
            options,
            channel,
            finalizer,
            progress: Mutex::new(Progress::default()),
            state,
            report: OnceLock::new(),
            finished,
        })
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn kind(&self) -> &TaskKind {
        &self.kind
    }

    pub fn targets(&self) -> &[(Target, Payload)] {
        &self.targets
    }

    pub fn state(&self) -> TaskState {
        *self.state.borrow()
    }

    /// True once every dispatched call has reported in.
    pub fn is_complete(&self) -> bool {
        self.state().is_complete()
    }

    /// The aggregate report, available once complete.
    pub fn report(&self) -> Option<Arc<AggregateReport>> {
        self.report.get().cloned()
    }

    pub async fn status(&self) -> TaskStatus {
        let progress = self.progress.lock().await;
        TaskStatus {
            id: self.id,
            kind: self.kind.clone(),
            state: self.state(),
            pending: progress.pending.len(),
            succeeded: progress.succeeded.len(),
            failed: progress.failed.len(),
            total: self.targets.len(),
        }
    }

    /// Resolve once the task is complete and its finalizer has run.
    ///
    /// Does not drive the task and has no deadline of its own. Never
    /// resolves for an aborted task.
    pub async fn wait(&self) -> Arc<AggregateReport> {
        let mut finished = self.finished.subscribe();
        loop {
            if let Some(report) = finished.borrow_and_update().clone() {
                return report;
            }
            // The sender lives in `self`, so this cannot observe a closed channel.
            let _ = finished.changed().await;
        }
    }

    /// Issue one call per target.
    ///
    /// Returns once every call is issued; replies are handled as they
    /// arrive. An empty target list completes immediately.
    #[tracing::instrument(name = "fanout.dispatch", skip_all, fields(task_id = %self.id, kind = %self.kind, targets = self.targets.len()))]
    pub async fn dispatch(self: &Arc<Self>) -> Result<(), CoordinatorError> {
        let completed = {
            // Held across every invoke: a reply that overtakes its own
            // registration blocks here until the id is registered.
            let mut progress = self.progress.lock().await;
            if self.state() != TaskState::Created {
                return Err(CoordinatorError::AlreadyDispatched(self.id));
            }
            self.state.send_replace(TaskState::Dispatched);

            let sink: Arc<dyn ReplySink> = self.clone();
            for (target, payload) in &self.targets {
                let issued = self
                    .channel
                    .invoke(target, &self.options.method, payload, Arc::clone(&sink))
                    .await;

                match issued {
                    Ok(correlation_id) => {
                        debug!(
                            %target,
                            %correlation_id,
                            packages = payload.packages().len(),
                            "Call issued"
                        );
                        if let Err(e) = progress.pending.register(correlation_id, target.clone())
                        {
                            error!(%target, error = %e, "Channel reused an outstanding correlation id");
                            // Replies to calls already issued become orphans.
                            progress.pending.drain();
                            self.state.send_replace(TaskState::Aborted);
                            return Err(e.into());
                        }
                    }
                    Err(e) => {
                        warn!(%target, error = %e, "Call rejected by channel");
                        progress.failed.push(TargetFailure {
                            target: target.clone(),
                            failure: e.into(),
                        });
                    }
                }
            }

            info!(
                pending = progress.pending.len(),
                rejected = progress.failed.len(),
                "Fan-out dispatched"
            );

            self.try_complete(&mut progress)
        };

        match completed {
            Some(report) => self.finalize(report).await,
            None => {
                if let Some(timeout) = self.options.reply_timeout {
                    self.arm_deadline(timeout);
                }
            }
        }

        Ok(())
    }

    async fn settle(&self, correlation_id: CorrelationId, outcome: Result<InvocationResult, RemoteFailure>) {
        let completed = {
            let mut progress = self.progress.lock().await;
            let Some(target) = progress.pending.resolve(&correlation_id) else {
                error!(
                    task_id = %self.id,
                    %correlation_id,
                    "Reply for unknown correlation id, discarded"
                );
                return;
            };

            match outcome {
                Ok(result) => {
                    debug!(task_id = %self.id, %target, "Call succeeded");
                    progress.succeeded.push(TargetSuccess { target, result });
                }
                Err(failure) => {
                    warn!(task_id = %self.id, %target, error = %failure, "Call failed");
                    progress.failed.push(TargetFailure { target, failure });
                }
            }

            self.try_complete(&mut progress)
        };

        if let Some(report) = completed {
            self.finalize(report).await;
        }
    }

    /// Must be called with `progress` locked.
    fn try_complete(&self, progress: &mut Progress) -> Option<Arc<AggregateReport>> {
        if self.state() != TaskState::Dispatched || !progress.pending.is_empty() {
            return None;
        }

        let report = Arc::new(AggregateReport::new(
            progress.succeeded.clone(),
            progress.failed.clone(),
        ));
        assert!(
            self.report.set(Arc::clone(&report)).is_ok(),
            "fan-out task {} completed twice",
            self.id
        );
        self.state.send_replace(TaskState::Complete);
        Some(report)
    }

    #[tracing::instrument(name = "fanout.finalize", skip_all, fields(task_id = %self.id, kind = %self.kind))]
    async fn finalize(&self, report: Arc<AggregateReport>) {
        info!(
            succeeded = report.succeeded().len(),
            failed = report.failed().len(),
            "Fan-out complete"
        );
        self.finalizer
            .finalize(self.id, &self.kind, Arc::clone(&report))
            .await;
        self.finished.send_replace(Some(report));
    }

    fn arm_deadline(self: &Arc<Self>, timeout: Duration) {
        let task = Arc::downgrade(self);
        tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            if let Some(task) = task.upgrade() {
                task.expire_pending(timeout).await;
            }
        });
    }

    /// Fail every target still pending after `timeout`.
    async fn expire_pending(&self, timeout: Duration) {
        let completed = {
            let mut progress = self.progress.lock().await;
            if self.state() != TaskState::Dispatched {
                return;
            }

            for (correlation_id, target) in progress.pending.drain() {
                warn!(
                    task_id = %self.id,
                    %target,
                    %correlation_id,
                    ?timeout,
                    "No reply before deadline"
                );
                progress.failed.push(TargetFailure {
                    target,
                    failure: RemoteFailure::new(format!("no reply within {:?}", timeout)),
                });
            }

            self.try_complete(&mut progress)
        };

        if let Some(report) = completed {
            self.finalize(report).await;
        }
    }
}

#[async_trait]
impl ReplySink for FanOutTask {
    async fn on_success(&self, id: CorrelationId, result: InvocationResult) {
        self.settle(id, Ok(result)).await;
    }

    async fn on_failure(&self, id: CorrelationId, failure: RemoteFailure) {
        self.settle(id, Err(failure)).await;
    }
}
