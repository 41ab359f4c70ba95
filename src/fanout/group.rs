//! Consumer-group operations.
//!
//! Resolve a group into per-consumer payloads, then submit one fan-out
//! task. Resolution errors reach the caller before any call is issued.

use std::sync::Arc;

use tracing::info;

use super::coordinator::{Coordinator, CoordinatorError, TaskHandle};
use super::kind::OperationSpec;
use crate::interfaces::TargetResolver;

/// Group-level entry points over a resolver and a coordinator.
pub struct GroupOperations {
    resolver: Arc<dyn TargetResolver>,
    coordinator: Arc<Coordinator>,
}

impl GroupOperations {
    pub fn new(resolver: Arc<dyn TargetResolver>, coordinator: Arc<Coordinator>) -> Self {
        Self {
            resolver,
            coordinator,
        }
    }

    /// Install `packages` on every consumer in `group_id`.
    pub async fn install_packages(
        &self,
        group_id: &str,
        packages: Vec<String>,
    ) -> Result<TaskHandle, CoordinatorError> {
        self.run(group_id, OperationSpec::InstallPackages { packages })
            .await
    }

    /// Apply errata on every consumer in `group_id`.
    ///
    /// With no `errata_ids` every pending update passing the `types`
    /// filter is installed.
    pub async fn install_errata(
        &self,
        group_id: &str,
        errata_ids: Vec<String>,
        types: Vec<String>,
    ) -> Result<TaskHandle, CoordinatorError> {
        self.run(group_id, OperationSpec::ApplyErrata { errata_ids, types })
            .await
    }

    #[tracing::instrument(name = "fanout.group", skip_all, fields(%group_id))]
    async fn run(
        &self,
        group_id: &str,
        operation: OperationSpec,
    ) -> Result<TaskHandle, CoordinatorError> {
        let targets = self.resolver.resolve(group_id, &operation).await?;
        info!(
            consumers = targets.len(),
            kind = %operation.task_kind(),
            "Group resolved"
        );
        self.coordinator
            .submit(operation.task_kind(), targets)
            .await
    }
}
