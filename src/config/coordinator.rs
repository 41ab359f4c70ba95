//! Coordinator configuration.

use std::time::Duration;

use serde::Deserialize;

use crate::fanout::kind::INSTALL_METHOD;
use crate::fanout::TaskOptions;

/// Fan-out coordinator settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CoordinatorConfig {
    /// Seconds to wait for outstanding replies before failing the targets.
    /// None = wait forever.
    pub reply_timeout_secs: Option<u64>,
    /// Agent method invoked on each target.
    pub method: String,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            reply_timeout_secs: None,
            method: INSTALL_METHOD.to_string(),
        }
    }
}

impl CoordinatorConfig {
    pub fn reply_timeout(&self) -> Option<Duration> {
        self.reply_timeout_secs.map(Duration::from_secs)
    }

    pub fn task_options(&self) -> TaskOptions {
        TaskOptions {
            method: self.method.clone(),
            reply_timeout: self.reply_timeout(),
        }
    }
}
