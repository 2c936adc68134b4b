//! Engine configuration.

use std::time::Duration;

/// Default wall-clock budget for one drain.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Configuration for one [`Engine`](crate::Engine).
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct EngineConfig {
    /// Number of worker threads draining the worklist (1 = current thread).
    pub workers: usize,
    /// Wall-clock budget for a drain.
    pub timeout: Option<Duration>,
    /// Maximum number of processed batches per drain.
    pub step_limit: Option<usize>,
    /// Stop scheduling once an error diagnostic has been reported.
    pub stop_on_error: bool,
    /// Unresolved-node reports kept per value kind by `finish`.
    pub unresolved_limit: usize,
    /// Diagnostics kept by the engine's error set (0 = unlimited).
    pub error_limit: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            workers: 1,
            timeout: Some(DEFAULT_TIMEOUT),
            step_limit: None,
            stop_on_error: false,
            unresolved_limit: 8,
            error_limit: 0,
        }
    }
}

impl EngineConfig {
    /// Create a config with no time or step budget (for testing).
    pub fn unbounded() -> Self {
        EngineConfig {
            timeout: None,
            step_limit: None,
            ..Self::default()
        }
    }

    /// Same config with `workers` drain threads.
    #[must_use]
    pub fn with_workers(self, workers: usize) -> Self {
        EngineConfig {
            workers: workers.max(1),
            ..self
        }
    }
}
