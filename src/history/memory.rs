//! In-memory consumer history.

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::debug;

use crate::fanout::{InvocationResult, Target};
use crate::interfaces::{HistoryError, HistoryExtra, HistoryRecorder};

/// One recorded package install.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub target: Target,
    pub result: InvocationResult,
    pub errata_titles: Vec<String>,
    pub recorded_at: DateTime<Utc>,
}

/// History recorder that keeps entries in memory.
///
/// Recording can be made to fail for chosen targets.
#[derive(Default)]
pub struct InMemoryHistory {
    entries: RwLock<Vec<HistoryEntry>>,
    failing: RwLock<HashSet<Target>>,
    attempts: RwLock<usize>,
}

impl InMemoryHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every later `record` for `target` fail.
    pub async fn fail_for(&self, target: Target) {
        self.failing.write().await.insert(target);
    }

    pub async fn entries(&self) -> Vec<HistoryEntry> {
        self.entries.read().await.clone()
    }

    pub async fn entries_for(&self, target: &Target) -> Vec<HistoryEntry> {
        self.entries
            .read()
            .await
            .iter()
            .filter(|e| &e.target == target)
            .cloned()
            .collect()
    }

    /// Number of `record` calls, successful or not.
    pub async fn attempts(&self) -> usize {
        *self.attempts.read().await
    }
}

#[async_trait]
impl HistoryRecorder for InMemoryHistory {
    async fn record(
        &self,
        target: &Target,
        result: &InvocationResult,
        extra: &HistoryExtra,
    ) -> Result<(), HistoryError> {
        *self.attempts.write().await += 1;

        if self.failing.read().await.contains(target) {
            return Err(HistoryError::Storage(format!(
                "history store rejected entry for {}",
                target
            )));
        }

        debug!(%target, errata = ?extra.errata_titles, "Packages installed");
        self.entries.write().await.push(HistoryEntry {
            target: target.clone(),
            result: result.clone(),
            errata_titles: extra.errata_titles.clone(),
            recorded_at: Utc::now(),
        });
        Ok(())
    }
}
