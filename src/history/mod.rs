//! Consumer history recorders.

pub mod memory;

pub use memory::{HistoryEntry, InMemoryHistory};
