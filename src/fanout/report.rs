//! Aggregate report produced when a fan-out task completes.

use super::{InvocationResult, RemoteFailure, Target};

/// A target whose call succeeded, with the agent's result.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetSuccess {
    pub target: Target,
    pub result: InvocationResult,
}

/// A target whose call failed.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetFailure {
    pub target: Target,
    pub failure: RemoteFailure,
}

/// Final partition of a task's targets into successes and failures.
///
/// Both sequences are in reply arrival order, not dispatch order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregateReport {
    succeeded: Vec<TargetSuccess>,
    failed: Vec<TargetFailure>,
}

impl AggregateReport {
    pub fn new(succeeded: Vec<TargetSuccess>, failed: Vec<TargetFailure>) -> Self {
        Self { succeeded, failed }
    }

    pub fn succeeded(&self) -> &[TargetSuccess] {
        &self.succeeded
    }

    pub fn failed(&self) -> &[TargetFailure] {
        &self.failed
    }

    /// Number of targets accounted for.
    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed.is_empty()
    }

    /// Look up the outcome for one target.
    pub fn failure_for(&self, target: &Target) -> Option<&RemoteFailure> {
        self.failed
            .iter()
            .find(|f| &f.target == target)
            .map(|f| &f.failure)
    }

    pub fn result_for(&self, target: &Target) -> Option<&InvocationResult> {
        self.succeeded
            .iter()
            .find(|s| &s.target == target)
            .map(|s| &s.result)
    }
}
