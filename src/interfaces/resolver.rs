//! Target resolution interface.

use async_trait::async_trait;

use crate::fanout::{OperationSpec, Payload, Target};

/// Result type for resolution.
pub type Result<T> = std::result::Result<T, ResolutionError>;

/// A group or a resource it references does not exist.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum ResolutionError {
    #[error("No consumer group with id: {0}")]
    GroupNotFound(String),

    #[error("No consumer with id: {0}")]
    ConsumerNotFound(String),

    #[error("Erratum {erratum} is not applicable to consumer {consumer}")]
    ErratumNotApplicable { consumer: String, erratum: String },
}

/// Turns a named group into concrete targets.
///
/// Validation happens here, before anything is dispatched.
#[async_trait]
pub trait TargetResolver: Send + Sync {
    /// Members of `group_id`, in group order.
    async fn members(&self, group_id: &str) -> Result<Vec<Target>>;

    /// One `(target, payload)` pair per member for `operation`.
    async fn resolve(
        &self,
        group_id: &str,
        operation: &OperationSpec,
    ) -> Result<Vec<(Target, Payload)>>;
}
