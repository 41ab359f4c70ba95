//! Fan-out remote invocation coordination.
//!
//! One logical operation addressed to a group of remote agents becomes one
//! asynchronous call per agent. Replies come back out of order, are matched
//! to their agent through the correlation registry, and the task completes
//! exactly once when every call has reported in (N-of-N).
//!
//! - `task`: the coordinator (`FanOutTask`)
//! - `registry`: correlation id -> target mapping
//! - `report`: the aggregate succeeded/failed partition
//! - `kind`: operation kinds sharing the coordinator
//! - `finalizer`: the single completion side effect
//! - `coordinator`: `submit()` surface returning `TaskHandle`s
//! - `group`: resolve-then-submit operations on consumer groups

pub mod coordinator;
pub mod finalizer;
pub mod group;
pub mod kind;
pub mod registry;
pub mod report;
pub mod task;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use coordinator::{Coordinator, CoordinatorError, TaskHandle};
pub use finalizer::{Finalizer, HistoryFinalizer};
pub use group::GroupOperations;
pub use kind::{OperationSpec, TaskKind};
pub use registry::{CorrelationRegistry, RegistryError};
pub use report::{AggregateReport, TargetFailure, TargetSuccess};
pub use task::{FanOutTask, TaskOptions, TaskStatus};

/// Result value returned by an agent. Opaque to the coordinator.
pub type InvocationResult = serde_json::Value;

/// Remote agent addressed by a fan-out operation (a consumer id).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Target(String);

impl Target {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Target {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Token identifying one outstanding call. Never reused.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorrelationId(String);

impl CorrelationId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Mint a fresh random id.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of one fan-out task, used for log correlation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(uuid::Uuid);

impl TaskId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Operation data sent to one target.
///
/// Immutable once built: the package list is only readable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Payload {
    packages: Vec<String>,
}

impl Payload {
    pub fn new<I, S>(packages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            packages: packages.into_iter().map(Into::into).collect(),
        }
    }

    /// Package names, in install order.
    pub fn packages(&self) -> &[String] {
        &self.packages
    }
}

/// Why a target's call failed.
///
/// `message` is the representation of the remote exception; `traceback`
/// is the formatted remote traceback when the agent supplied one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteFailure {
    pub message: String,
    pub traceback: Option<String>,
}

impl RemoteFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            traceback: None,
        }
    }

    pub fn with_traceback(mut self, traceback: impl Into<String>) -> Self {
        self.traceback = Some(traceback.into());
        self
    }
}

impl fmt::Display for RemoteFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Task lifecycle. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TaskState {
    #[default]
    Created,
    Dispatched,
    Complete,
    /// Dispatch hit a channel contract violation. No report, no finalizer.
    Aborted,
}

impl TaskState {
    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Complete)
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Created => "created",
            Self::Dispatched => "dispatched",
            Self::Complete => "complete",
            Self::Aborted => "aborted",
        };
        f.write_str(name)
    }
}
