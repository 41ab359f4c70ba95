//! Task submission surface.
//!
//! `Coordinator::submit` builds a `FanOutTask` for one operation kind,
//! dispatches it and returns a `TaskHandle`. The handle never blocks:
//! `is_complete()`/`report()` are snapshots and `wait()` is a future the
//! caller may bound with `tokio::time::timeout`.

use std::sync::Arc;

use tracing::info;

use super::finalizer::Finalizer;
use super::kind::TaskKind;
use super::registry::RegistryError;
use super::report::AggregateReport;
use super::task::{FanOutTask, TaskOptions, TaskStatus};
use super::{CorrelationId, Payload, Target, TaskId, TaskState};
use crate::config::CoordinatorConfig;
use crate::interfaces::{InvocationChannel, ResolutionError};

/// Errors surfaced to the submitter.
///
/// Per-target failures are not errors; they end up in the report.
#[derive(Debug, thiserror::Error)]
pub enum CoordinatorError {
    #[error("Resolution failed: {0}")]
    Resolution(#[from] ResolutionError),

    #[error("Channel returned an outstanding correlation id: {0}")]
    DuplicateCorrelation(CorrelationId),

    #[error("Task {0} was already dispatched")]
    AlreadyDispatched(TaskId),
}

impl From<RegistryError> for CoordinatorError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::DuplicateCorrelation(id) => Self::DuplicateCorrelation(id),
        }
    }
}

/// Builds and dispatches fan-out tasks over a shared channel and finalizer.
pub struct Coordinator {
    channel: Arc<dyn InvocationChannel>,
    finalizer: Arc<dyn Finalizer>,
    options: TaskOptions,
}

impl Coordinator {
    pub fn new(
        channel: Arc<dyn InvocationChannel>,
        finalizer: Arc<dyn Finalizer>,
        options: TaskOptions,
    ) -> Self {
        Self {
            channel,
            finalizer,
            options,
        }
    }

    /// Create from configuration.
    pub fn from_config(
        config: &CoordinatorConfig,
        channel: Arc<dyn InvocationChannel>,
        finalizer: Arc<dyn Finalizer>,
    ) -> Self {
        Self::new(channel, finalizer, config.task_options())
    }

    pub fn options(&self) -> &TaskOptions {
        &self.options
    }

    /// Build a task for `kind` and dispatch it.
    pub async fn submit(
        &self,
        kind: TaskKind,
        targets: Vec<(Target, Payload)>,
    ) -> Result<TaskHandle, CoordinatorError> {
        let task = FanOutTask::new(
            kind,
            targets,
            Arc::clone(&self.channel),
            Arc::clone(&self.finalizer),
            self.options.clone(),
        );

        info!(
            task_id = %task.id(),
            kind = %task.kind(),
            targets = task.targets().len(),
            "Submitting fan-out task"
        );

        task.dispatch().await?;
        Ok(TaskHandle { task })
    }
}

/// Caller's view of a submitted task.
#[derive(Clone)]
pub struct TaskHandle {
    task: Arc<FanOutTask>,
}

impl TaskHandle {
    pub fn id(&self) -> TaskId {
        self.task.id()
    }

    pub fn kind(&self) -> &TaskKind {
        self.task.kind()
    }

    pub fn state(&self) -> TaskState {
        self.task.state()
    }

    pub fn is_complete(&self) -> bool {
        self.task.is_complete()
    }

    /// The aggregate report once the task is complete.
    pub fn report(&self) -> Option<Arc<AggregateReport>> {
        self.task.report()
    }

    pub async fn status(&self) -> TaskStatus {
        self.task.status().await
    }

    /// Resolve after completion and finalization.
    pub async fn wait(&self) -> Arc<AggregateReport> {
        self.task.wait().await
    }

    /// The underlying task, which is also the reply sink for its calls.
    pub fn task(&self) -> &Arc<FanOutTask> {
        &self.task
    }
}
