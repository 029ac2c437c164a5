//! Idle auto-stop and the pause gate.

use std::time::Duration;

use tokio::time::Instant;

use crate::config::SupervisorConfig;

pub struct Supervisor {
    idle_timeout: Duration,
    check_interval: Duration,
    paused: bool,
}

impl Supervisor {
    pub fn new(idle_timeout: Duration, check_interval: Duration) -> Self {
        Self {
            idle_timeout,
            check_interval,
            paused: false,
        }
    }

    pub fn from_config(config: &SupervisorConfig) -> Self {
        Self::new(
            Duration::from_secs(config.idle_timeout_secs),
            Duration::from_secs(config.check_interval_secs.max(1)),
        )
    }

    pub fn check_interval(&self) -> Duration {
        self.check_interval
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Close the gate.  Returns `false` if it was already closed.
    pub fn pause(&mut self) -> bool {
        !std::mem::replace(&mut self.paused, true)
    }

    /// Open the gate.  Returns `false` if it was already open.
    pub fn resume(&mut self) -> bool {
        std::mem::replace(&mut self.paused, false)
    }

    /// Listening has gone on without activity for longer than the timeout.
    pub fn should_stop_listening(
        &self,
        now: Instant,
        last_activity: Instant,
        listening: bool,
        speaking: bool,
    ) -> bool {
        listening && !speaking && now.saturating_duration_since(last_activity) > self.idle_timeout
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn supervisor() -> Supervisor {
        Supervisor::from_config(&SupervisorConfig::default())
    }

    #[test]
    fn pause_and_resume_report_changes() {
        let mut s = supervisor();
        assert!(s.pause());
        assert!(!s.pause());
        assert!(s.is_paused());
        assert!(s.resume());
        assert!(!s.resume());
    }

    #[test]
    fn idle_timeout_is_strict() {
        let s = supervisor();
        let start = Instant::now();
        assert!(!s.should_stop_listening(start + Duration::from_secs(19), start, true, false));
        assert!(!s.should_stop_listening(start + Duration::from_secs(20), start, true, false));
        assert!(s.should_stop_listening(start + Duration::from_secs(21), start, true, false));
    }

    #[test]
    fn only_idle_listening_is_stopped() {
        let s = supervisor();
        let start = Instant::now();
        let late = start + Duration::from_secs(60);
        assert!(!s.should_stop_listening(late, start, false, false));
        assert!(!s.should_stop_listening(late, start, true, true));
    }

    #[test]
    fn zero_check_interval_is_clamped() {
        let s = Supervisor::from_config(&SupervisorConfig {
            idle_timeout_secs: 20,
            check_interval_secs: 0,
        });
        assert_eq!(s.check_interval(), Duration::from_secs(1));
    }
}
