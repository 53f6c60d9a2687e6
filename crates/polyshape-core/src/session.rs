//! Inactivity tracking for the admin session.
//!
//! The monitor is a pure state machine driven by the caller's clock, so the
//! shell can poll it from a timer tick and tests can step through time.

use std::time::{Duration, Instant};

use crate::config::SessionConfig;

/// What the caller should do after polling the monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// Nothing to show.
    Active,
    /// The warning just became visible.
    WarningShown { remaining: Duration },
    /// The warning is visible; countdown update.
    Countdown { remaining: Duration },
    /// The idle window elapsed; the session must end.
    Expired,
}

/// Tracks user activity and decides when to warn and when to sign out.
///
/// Activity before the warning resets the idle window. Once the warning is
/// visible, activity is ignored until [`InactivityMonitor::extend`] is called.
#[derive(Debug, Clone)]
pub struct InactivityMonitor {
    enabled: bool,
    idle_timeout: Duration,
    warning: Duration,
    last_reset: Instant,
    warning_visible: bool,
    expired: bool,
}

impl InactivityMonitor {
    pub fn new(config: &SessionConfig, now: Instant) -> Self {
        Self {
            enabled: config.enabled,
            idle_timeout: config.idle_timeout,
            warning: config.warning.min(config.idle_timeout),
            last_reset: now,
            warning_visible: false,
            expired: false,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn warning_visible(&self) -> bool {
        self.warning_visible
    }

    /// Records user activity. Returns false when it was ignored because the
    /// warning is visible.
    pub fn record_activity(&mut self, now: Instant) -> bool {
        if self.warning_visible || self.expired {
            return false;
        }
        self.last_reset = now;
        true
    }

    /// Explicit confirmation from the user: hide the warning and restart the
    /// idle window.
    pub fn extend(&mut self, now: Instant) {
        if self.expired {
            return;
        }
        self.warning_visible = false;
        self.last_reset = now;
    }

    /// Time left before the session ends.
    pub fn remaining(&self, now: Instant) -> Duration {
        self.idle_timeout
            .saturating_sub(now.saturating_duration_since(self.last_reset))
    }

    pub fn poll(&mut self, now: Instant) -> SessionEvent {
        if !self.enabled {
            return SessionEvent::Active;
        }
        if self.expired {
            return SessionEvent::Expired;
        }

        let remaining = self.remaining(now);
        if remaining.is_zero() {
            self.expired = true;
            self.warning_visible = false;
            return SessionEvent::Expired;
        }
        if remaining <= self.warning {
            if self.warning_visible {
                return SessionEvent::Countdown { remaining };
            }
            self.warning_visible = true;
            return SessionEvent::WarningShown { remaining };
        }
        SessionEvent::Active
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> SessionConfig {
        SessionConfig {
            enabled: true,
            idle_timeout: Duration::from_secs(600),
            warning: Duration::from_secs(60),
        }
    }

    fn secs(n: u64) -> Duration {
        Duration::from_secs(n)
    }

    #[test]
    fn test_active_before_warning() {
        let start = Instant::now();
        let mut monitor = InactivityMonitor::new(&config(), start);
        assert_eq!(monitor.poll(start + secs(539)), SessionEvent::Active);
        assert!(!monitor.warning_visible());
    }

    #[test]
    fn test_warning_then_countdown_then_expiry() {
        let start = Instant::now();
        let mut monitor = InactivityMonitor::new(&config(), start);

        assert_eq!(
            monitor.poll(start + secs(540)),
            SessionEvent::WarningShown { remaining: secs(60) }
        );
        assert_eq!(
            monitor.poll(start + secs(570)),
            SessionEvent::Countdown { remaining: secs(30) }
        );
        assert_eq!(monitor.poll(start + secs(600)), SessionEvent::Expired);
        assert_eq!(monitor.poll(start + secs(601)), SessionEvent::Expired);
    }

    #[test]
    fn test_activity_before_warning_resets_window() {
        let start = Instant::now();
        let mut monitor = InactivityMonitor::new(&config(), start);

        assert!(monitor.record_activity(start + secs(500)));
        assert_eq!(monitor.poll(start + secs(600)), SessionEvent::Active);
        assert_eq!(monitor.remaining(start + secs(600)), secs(500));
    }

    #[test]
    fn test_activity_ignored_while_warning_visible() {
        let start = Instant::now();
        let mut monitor = InactivityMonitor::new(&config(), start);

        monitor.poll(start + secs(545));
        assert!(monitor.warning_visible());
        assert!(!monitor.record_activity(start + secs(550)));
        assert_eq!(monitor.poll(start + secs(600)), SessionEvent::Expired);
    }

    #[test]
    fn test_extend_hides_warning_and_restarts() {
        let start = Instant::now();
        let mut monitor = InactivityMonitor::new(&config(), start);

        monitor.poll(start + secs(550));
        monitor.extend(start + secs(555));
        assert!(!monitor.warning_visible());
        assert_eq!(monitor.poll(start + secs(1000)), SessionEvent::Active);
        assert_eq!(
            monitor.poll(start + secs(1095)),
            SessionEvent::WarningShown { remaining: secs(60) }
        );
    }

    #[test]
    fn test_disabled_never_expires() {
        let start = Instant::now();
        let mut monitor = InactivityMonitor::new(
            &SessionConfig {
                enabled: false,
                ..config()
            },
            start,
        );
        assert_eq!(monitor.poll(start + secs(10_000)), SessionEvent::Active);
        assert!(!monitor.is_enabled());
    }
}
