//! Elapsed session time.

use chrono::{DateTime, Utc};

/// Elapsed time since a game started, for the header clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionClock {
    started_at: Option<DateTime<Utc>>,
}

impl SessionClock {
    /// Clock for a game created at `started_at`. `None` reads `00:00:00`.
    #[must_use]
    pub const fn new(started_at: Option<DateTime<Utc>>) -> Self {
        Self { started_at }
    }

    /// Seconds elapsed at `now`, never negative.
    #[must_use]
    pub fn elapsed_secs(&self, now: DateTime<Utc>) -> i64 {
        self.started_at
            .map_or(0, |start| (now - start).num_seconds().max(0))
    }

    /// Elapsed time at `now` as `HH:MM:SS`. Hours keep counting past 99.
    #[must_use]
    pub fn format_at(&self, now: DateTime<Utc>) -> String {
        let secs = self.elapsed_secs(now);
        format!("{:02}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
    }

    /// Elapsed time right now as `HH:MM:SS`.
    #[must_use]
    pub fn display(&self) -> String {
        self.format_at(Utc::now())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    #[test]
    fn formats_hours_minutes_seconds() {
        let start = Utc::now();
        let clock = SessionClock::new(Some(start));
        assert_eq!(clock.format_at(start), "00:00:00");
        assert_eq!(clock.format_at(start + Duration::seconds(3_725)), "01:02:05");
        assert_eq!(clock.format_at(start + Duration::hours(101)), "101:00:00");
    }

    #[test]
    fn clock_skew_and_missing_start_read_zero() {
        let start = Utc::now();
        let clock = SessionClock::new(Some(start));
        assert_eq!(clock.format_at(start - Duration::seconds(30)), "00:00:00");
        assert_eq!(SessionClock::new(None).display(), "00:00:00");
    }
}
