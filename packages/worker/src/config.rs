//! Worker configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for worker behavior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// Name used in worker logs.
    pub worker_id: String,
    /// Upper bound for a single handler invocation (seconds). Unbounded when
    /// unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub handler_timeout_secs: Option<u64>,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            worker_id: "worker-1".to_string(),
            handler_timeout_secs: None,
        }
    }
}

impl WorkerConfig {
    pub fn with_worker_id(mut self, worker_id: impl Into<String>) -> Self {
        self.worker_id = worker_id.into();
        self
    }

    /// Set the handler timeout.
    pub fn with_handler_timeout(mut self, timeout_secs: u64) -> Self {
        self.handler_timeout_secs = Some(timeout_secs);
        self
    }

    pub fn handler_timeout(&self) -> Option<Duration> {
        self.handler_timeout_secs.map(Duration::from_secs)
    }
}
