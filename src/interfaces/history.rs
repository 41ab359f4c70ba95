//! Consumer history recording interface.

use async_trait::async_trait;

use crate::fanout::{InvocationResult, Target};

/// Errors from history recording.
#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    #[error("History storage failed: {0}")]
    Storage(String),
}

/// Extra data attached to a history entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryExtra {
    /// Errata applied by the operation, empty for plain package installs.
    pub errata_titles: Vec<String>,
}

/// Records what an operation did to a consumer.
///
/// Each call is independent: no transaction spans several targets.
#[async_trait]
pub trait HistoryRecorder: Send + Sync {
    async fn record(
        &self,
        target: &Target,
        result: &InvocationResult,
        extra: &HistoryExtra,
    ) -> Result<(), HistoryError>;
}
