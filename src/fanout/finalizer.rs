//! Completion side effects.
//!
//! A finalizer runs once per task, after the last reply. `HistoryFinalizer`
//! records a consumer history entry for every succeeded target. Recording
//! is best-effort per target: one failing entry never stops the others.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use super::kind::TaskKind;
use super::report::AggregateReport;
use super::TaskId;
use crate::interfaces::{HistoryExtra, HistoryRecorder};

/// Consumes the aggregate report of a completed task.
#[async_trait]
pub trait Finalizer: Send + Sync {
    async fn finalize(&self, task_id: TaskId, kind: &TaskKind, report: Arc<AggregateReport>);
}

/// Records package-install history for succeeded targets.
pub struct HistoryFinalizer {
    recorder: Arc<dyn HistoryRecorder>,
}

impl HistoryFinalizer {
    pub fn new(recorder: Arc<dyn HistoryRecorder>) -> Self {
        Self { recorder }
    }
}

#[async_trait]
impl Finalizer for HistoryFinalizer {
    async fn finalize(&self, task_id: TaskId, kind: &TaskKind, report: Arc<AggregateReport>) {
        let extra = HistoryExtra {
            errata_titles: kind.errata_titles().to_vec(),
        };

        for failed in report.failed() {
            warn!(
                %task_id,
                target = %failed.target,
                error = %failed.failure,
                "Target failed, no history recorded"
            );
        }

        let mut recorded = 0usize;
        let mut not_recorded = 0usize;
        for success in report.succeeded() {
            match self
                .recorder
                .record(&success.target, &success.result, &extra)
                .await
            {
                Ok(()) => recorded += 1,
                Err(e) => {
                    not_recorded += 1;
                    warn!(
                        %task_id,
                        target = %success.target,
                        error = %e,
                        "Failed to record consumer history"
                    );
                }
            }
        }

        info!(
            %task_id,
            %kind,
            recorded,
            not_recorded,
            failed_targets = report.failed().len(),
            "Consumer history recorded"
        );
    }
}
