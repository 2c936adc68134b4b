//! Wall-clock and step budgets for one drain.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use crate::config::EngineConfig;
use crate::error::ScheduleError;

pub(crate) struct Watchdog {
    started: Instant,
    timeout: Option<Duration>,
    step_limit: Option<usize>,
    steps: AtomicUsize,
}

impl Watchdog {
    pub(crate) fn new(config: &EngineConfig) -> Self {
        Watchdog {
            started: Instant::now(),
            timeout: config.timeout,
            step_limit: config.step_limit,
            steps: AtomicUsize::new(0),
        }
    }

    /// When waiting drainers must give up.
    pub(crate) fn deadline(&self) -> Option<Instant> {
        self.timeout.map(|t| self.started + t)
    }

    /// Count one batch against the step budget.
    pub(crate) fn step(&self) -> Result<(), ScheduleError> {
        let taken = self.steps.fetch_add(1, Ordering::Relaxed) + 1;
        match self.step_limit {
            Some(limit) if taken > limit => Err(ScheduleError::StepLimit { limit }),
            _ => Ok(()),
        }
    }

    pub(crate) fn check_time(&self) -> Result<(), ScheduleError> {
        match self.timeout {
            Some(budget) if self.started.elapsed() > budget => Err(self.expired()),
            _ => Ok(()),
        }
    }

    /// The timeout error for the current elapsed time.
    pub(crate) fn expired(&self) -> ScheduleError {
        ScheduleError::Timeout {
            elapsed: self.started.elapsed(),
            budget: self.timeout.unwrap_or_default(),
        }
    }

    pub(crate) fn steps(&self) -> usize {
        self.steps.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_limit() {
        let watchdog = Watchdog::new(&EngineConfig {
            step_limit: Some(2),
            ..EngineConfig::unbounded()
        });
        assert!(watchdog.step().is_ok());
        assert!(watchdog.step().is_ok());
        assert_eq!(
            watchdog.step(),
            Err(ScheduleError::StepLimit { limit: 2 })
        );
        assert_eq!(watchdog.steps(), 3);
    }

    #[test]
    fn test_unbounded_never_expires() {
        let watchdog = Watchdog::new(&EngineConfig::unbounded());
        assert_eq!(watchdog.deadline(), None);
        assert!(watchdog.check_time().is_ok());
    }

    #[test]
    fn test_zero_timeout_expires() {
        let watchdog = Watchdog::new(&EngineConfig {
            timeout: Some(Duration::ZERO),
            ..EngineConfig::unbounded()
        });
        std::thread::sleep(Duration::from_millis(2));
        assert!(matches!(
            watchdog.check_time(),
            Err(ScheduleError::Timeout { .. })
        ));
    }
}
