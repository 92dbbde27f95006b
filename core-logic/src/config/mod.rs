use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How a batch admits its operations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchMode {
    /// Consecutive windows; each window is awaited as a whole.
    #[default]
    Windowed,
    /// Sliding window; a new operation starts as soon as one finishes.
    Pipelined,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutorConfig {
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    #[serde(default)]
    pub mode: BatchMode,
    #[serde(default)]
    pub op_timeout_secs: Option<u64>,
}

fn default_concurrency() -> usize {
    5
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            mode: BatchMode::default(),
            op_timeout_secs: None,
        }
    }
}

impl ExecutorConfig {
    pub fn op_timeout(&self) -> Option<Duration> {
        self.op_timeout_secs.map(Duration::from_secs)
    }
}
