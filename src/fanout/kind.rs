//! Operation kinds sharing the fan-out coordinator.
//!
//! Kinds differ only in how payloads are built (by the target resolver)
//! and in what the finalizer attaches to history entries. The coordination
//! algorithm is the same for every kind.

use std::fmt;

/// Agent method invoked for package installation.
pub const INSTALL_METHOD: &str = "Packages.install";

/// Kind of fan-out operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskKind {
    /// Install an explicit package list on every target.
    InstallPackages,
    /// Install the packages resolved from errata. The errata ids are fixed
    /// here at construction and only feed the history record.
    ApplyErrata { errata: Vec<String> },
}

impl TaskKind {
    /// Errata titles recorded alongside each successful install.
    pub fn errata_titles(&self) -> &[String] {
        match self {
            Self::InstallPackages => &[],
            Self::ApplyErrata { errata } => errata,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::InstallPackages => "install_packages",
            Self::ApplyErrata { .. } => "apply_errata",
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What a caller asks to be done to a group, before resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationSpec {
    /// Install `packages` on every member.
    InstallPackages { packages: Vec<String> },
    /// Apply errata. Empty `errata_ids` means every pending update; empty
    /// `types` means no errata type filter.
    ApplyErrata {
        errata_ids: Vec<String>,
        types: Vec<String>,
    },
}

impl OperationSpec {
    /// The task kind this operation runs as.
    pub fn task_kind(&self) -> TaskKind {
        match self {
            Self::InstallPackages { .. } => TaskKind::InstallPackages,
            Self::ApplyErrata { errata_ids, .. } => TaskKind::ApplyErrata {
                errata: errata_ids.clone(),
            },
        }
    }
}
