//! Agent fan-out coordinator.
//!
//! Dispatches one administrative operation (package install, errata
//! application) to every consumer of a group, correlates the asynchronous
//! agent replies, and finalizes the operation exactly once when all of them
//! have reported in.

pub mod channel;
pub mod config;
pub mod fanout;
pub mod history;
pub mod interfaces;
pub mod resolver;
pub mod utils;

#[cfg(test)]
pub(crate) mod test_utils;

pub use fanout::{
    AggregateReport, Coordinator, CoordinatorError, GroupOperations, Payload, RemoteFailure,
    Target, TaskHandle, TaskKind,
};
