//! Abstract interfaces for the collaborators of the fan-out coordinator.
//!
//! These traits define the contracts for:
//! - Remote invocation (send a call, get a correlation id, reply later)
//! - Target resolution (group -> targets and payloads)
//! - History recording (per-target side effect of a finished task)

pub mod channel;
pub mod history;
pub mod resolver;

pub use channel::{ChannelError, InvocationChannel, ReplySink};
pub use history::{HistoryError, HistoryExtra, HistoryRecorder};
pub use resolver::{ResolutionError, TargetResolver};
