//! Schedule windows
//!
//! A schedule is an optional list of UTC windows during which cycles may run.
//! An empty schedule means "always on". Windows are half-open, so a tick that
//! lands exactly on a window's end belongs to no window.

use chrono::{DateTime, NaiveDateTime, Utc};

use crate::error::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl ScheduleWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, String> {
        if start >= end {
            return Err(format!(
                "start {} must be before end {}",
                start.to_rfc3339(),
                end.to_rfc3339()
            ));
        }
        Ok(Self { start, end })
    }

    /// Parse a window from two ISO-8601 timestamps. `index` is the window's
    /// position in the configured list and only used for error reporting.
    pub fn parse(index: usize, start: &str, end: &str) -> Result<Self, ConfigError> {
        let start = parse_utc(start).map_err(|reason| ConfigError::InvalidSchedule {
            index,
            reason: format!("start: {}", reason),
        })?;
        let end = parse_utc(end).map_err(|reason| ConfigError::InvalidSchedule {
            index,
            reason: format!("end: {}", reason),
        })?;
        Self::new(start, end).map_err(|reason| ConfigError::InvalidSchedule { index, reason })
    }

    pub fn contains(&self, now: DateTime<Utc>) -> bool {
        self.start <= now && now < self.end
    }
}

/// Returns true when a cycle may run at `now`.
pub fn is_allowed(now: DateTime<Utc>, windows: &[ScheduleWindow]) -> bool {
    windows.is_empty() || windows.iter().any(|w| w.contains(now))
}

/// Timestamps with an offset are converted to UTC; timestamps without one are
/// taken to already be UTC.
fn parse_utc(raw: &str) -> Result<DateTime<Utc>, String> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    for layout in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, layout) {
            return Ok(naive.and_utc());
        }
    }
    Err(format!("'{}' is not an ISO-8601 timestamp", raw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, h, m, 0).unwrap()
    }

    fn game_window() -> ScheduleWindow {
        ScheduleWindow::new(at(18, 0), at(21, 30)).unwrap()
    }

    #[test]
    fn empty_schedule_is_always_allowed() {
        assert!(is_allowed(at(3, 0), &[]));
        assert!(is_allowed(DateTime::<Utc>::MIN_UTC, &[]));
        assert!(is_allowed(DateTime::<Utc>::MAX_UTC, &[]));
    }

    #[test]
    fn window_is_half_open() {
        let windows = [game_window()];
        assert!(is_allowed(at(18, 0), &windows));
        assert!(is_allowed(at(21, 29), &windows));
        assert!(!is_allowed(at(21, 30), &windows));
        assert!(!is_allowed(at(17, 59), &windows));
    }

    #[test]
    fn any_overlapping_or_disjoint_window_matches() {
        let windows = [
            ScheduleWindow::new(at(1, 0), at(2, 0)).unwrap(),
            game_window(),
            ScheduleWindow::new(at(21, 0), at(23, 0)).unwrap(),
        ];
        assert!(is_allowed(at(1, 30), &windows));
        assert!(is_allowed(at(21, 45), &windows));
        assert!(!is_allowed(at(12, 0), &windows));
    }

    #[test]
    fn parse_converts_offsets_to_utc() {
        let window =
            ScheduleWindow::parse(0, "2025-06-01T20:00:00+02:00", "2025-06-01T21:30:00Z").unwrap();
        assert_eq!(window.start, at(18, 0));
        assert_eq!(window.end, at(21, 30));
    }

    #[test]
    fn parse_treats_naive_timestamps_as_utc() {
        let window = ScheduleWindow::parse(0, "2025-06-01T18:00:00", "2025-06-01 21:30:00").unwrap();
        assert_eq!(window, game_window());
    }

    #[test]
    fn parse_rejects_inverted_and_empty_windows() {
        let inverted = ScheduleWindow::parse(2, "2025-06-01T21:30:00Z", "2025-06-01T18:00:00Z");
        assert!(matches!(
            inverted,
            Err(ConfigError::InvalidSchedule { index: 2, .. })
        ));

        let empty = ScheduleWindow::parse(0, "2025-06-01T18:00:00Z", "2025-06-01T18:00:00Z");
        assert!(empty.is_err());
    }

    #[test]
    fn parse_rejects_garbage() {
        let err = ScheduleWindow::parse(1, "tonight", "2025-06-01T18:00:00Z").unwrap_err();
        assert!(err.to_string().contains("#1"));
        assert!(err.to_string().contains("tonight"));
    }

    #[test]
    fn contains_uses_exact_instants() {
        let window = game_window();
        assert!(!window.contains(at(21, 30)));
        assert!(window.contains(at(21, 30) - Duration::nanoseconds(1)));
    }
}
