//! Reply correlation registry.
//!
//! Maps the correlation id of each outstanding call to the target that
//! issued it. Entries are inserted at dispatch and removed when the reply
//! resolves them. The registry itself is not synchronized: it lives inside
//! the owning task's progress lock so that "remove, record, check complete"
//! runs as one critical section.

use std::collections::HashMap;

use super::{CorrelationId, Target};

/// Errors from registry operations.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Correlation id already registered: {0}")]
    DuplicateCorrelation(CorrelationId),
}

/// Outstanding calls, keyed by correlation id.
#[derive(Debug, Default)]
pub struct CorrelationRegistry {
    entries: HashMap<CorrelationId, Target>,
}

impl CorrelationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `id` was issued for `target`.
    pub fn register(&mut self, id: CorrelationId, target: Target) -> Result<(), RegistryError> {
        if self.entries.contains_key(&id) {
            return Err(RegistryError::DuplicateCorrelation(id));
        }
        self.entries.insert(id, target);
        Ok(())
    }

    /// Remove and return the target for `id`, or `None` for an orphan.
    pub fn resolve(&mut self, id: &CorrelationId) -> Option<Target> {
        self.entries.remove(id)
    }

    /// Remove every outstanding entry.
    pub fn drain(&mut self) -> Vec<(CorrelationId, Target)> {
        self.entries.drain().collect()
    }

    pub fn contains(&self, id: &CorrelationId) -> bool {
        self.entries.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
