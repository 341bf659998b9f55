use chrono::{DateTime, Duration, Utc};
use ratatui::prelude::*;

use crate::domain::time_ago;

/// "Time since" label that recomputes itself on a fixed interval while live.
///
/// The owning screen drives it through [`TimeAgo::tick`]; once the screen is
/// dropped no further refreshes happen.
#[derive(Debug, Clone)]
pub struct TimeAgo {
    time: DateTime<Utc>,
    live: bool,
    interval: Duration,
    display: String,
    last_refresh: DateTime<Utc>,
}

impl TimeAgo {
    pub fn new(time: DateTime<Utc>, live: bool, interval: Duration, now: DateTime<Utc>) -> Self {
        Self {
            time,
            live,
            interval,
            display: time_ago(time, now),
            last_refresh: now,
        }
    }

    /// Recompute the label if live and the interval has elapsed.
    /// Returns true when the label was refreshed.
    pub fn tick(&mut self, now: DateTime<Utc>) -> bool {
        if !self.live || now - self.last_refresh < self.interval {
            return false;
        }
        self.display = time_ago(self.time, now);
        self.last_refresh = now;
        true
    }

    pub fn display(&self) -> &str {
        &self.display
    }

    pub fn span(&self, style: Style) -> Span<'_> {
        Span::styled(self.display.as_str(), style)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn refreshes_once_interval_elapses() {
        let mut label = TimeAgo::new(start(), true, Duration::seconds(60), start());
        assert_eq!(label.display(), "Just now");

        assert!(!label.tick(start() + Duration::seconds(59)));
        assert_eq!(label.display(), "Just now");

        assert!(label.tick(start() + Duration::minutes(5)));
        assert_eq!(label.display(), "5 minutes ago");
    }

    #[test]
    fn static_label_never_refreshes() {
        let mut label = TimeAgo::new(start(), false, Duration::seconds(60), start());

        assert!(!label.tick(start() + Duration::hours(3)));
        assert_eq!(label.display(), "Just now");
    }

    #[test]
    fn span_uses_current_display() {
        let label = TimeAgo::new(start(), true, Duration::seconds(60), start() + Duration::hours(2));
        assert_eq!(label.span(Style::default()).content, "2 hours ago");
    }
}
