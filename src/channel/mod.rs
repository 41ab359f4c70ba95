//! Invocation channel implementations.
//!
//! - `queued`: hands calls to an external transport pump
//! - `loopback`: answers calls with in-process agents

pub mod loopback;
pub mod queued;

pub use loopback::{LocalAgent, LoopbackChannel, LoopbackConfig, PackageAgent};
pub use queued::{OutboundCall, QueuedChannel, ReplyHandle};
