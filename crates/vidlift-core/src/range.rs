//! Safe capture range tracking
//!
//! The recorder may still be writing the segment that contains "now", so every
//! requested range ends `buffer` before the current time. After the first
//! cycle, each range starts exactly where the last successful one ended, which
//! keeps the uploaded ranges contiguous and non-overlapping. A failed cycle
//! leaves `last_end` untouched and the same start is requested again.

use chrono::{DateTime, Duration, Utc};

use crate::models::CaptureRange;

/// Compute the next range to request, or `None` when it would be empty
/// (clock skew, or a tick arriving sooner than `buffer` after the last end).
pub fn next_range(
    now: DateTime<Utc>,
    last_end: Option<DateTime<Utc>>,
    interval: Duration,
    buffer: Duration,
) -> Option<CaptureRange> {
    let start = last_end.unwrap_or(now - interval);
    let end = now - buffer;
    CaptureRange::new(start, end)
}

/// Owns the end of the last successfully uploaded range.
#[derive(Debug, Clone)]
pub struct RangeTracker {
    last_end: Option<DateTime<Utc>>,
    interval: Duration,
    buffer: Duration,
}

impl RangeTracker {
    pub fn new(interval: Duration, buffer: Duration) -> Self {
        Self {
            last_end: None,
            interval,
            buffer,
        }
    }

    pub fn last_end(&self) -> Option<DateTime<Utc>> {
        self.last_end
    }

    pub fn next_range(&self, now: DateTime<Utc>) -> Option<CaptureRange> {
        next_range(now, self.last_end, self.interval, self.buffer)
    }

    /// Record that `range` was captured and uploaded.
    pub fn advance(&mut self, range: &CaptureRange) {
        self.last_end = Some(range.end);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    fn tracker() -> RangeTracker {
        RangeTracker::new(Duration::minutes(5), Duration::seconds(30))
    }

    #[test]
    fn first_range_reaches_back_one_interval() {
        let range = tracker().next_range(t0()).unwrap();
        assert_eq!(range.start, t0() - Duration::minutes(5));
        assert_eq!(range.end, t0() - Duration::seconds(30));
    }

    #[test]
    fn later_ranges_start_at_last_end() {
        let mut tracker = tracker();
        let first = tracker.next_range(t0()).unwrap();
        tracker.advance(&first);

        let second = tracker.next_range(t0() + Duration::minutes(5)).unwrap();
        assert_eq!(second.start, first.end);
        assert_eq!(second.end, t0() + Duration::minutes(5) - Duration::seconds(30));
    }

    #[test]
    fn successful_sequence_is_contiguous() {
        let mut tracker = tracker();
        let mut ranges = Vec::new();
        for tick in 0..10 {
            let now = t0() + Duration::minutes(5 * tick);
            let range = tracker.next_range(now).unwrap();
            tracker.advance(&range);
            ranges.push(range);
        }
        for pair in ranges.windows(2) {
            assert_eq!(pair[0].end, pair[1].start);
            assert!(pair[0].start < pair[0].end);
        }
    }

    #[test]
    fn without_advance_the_start_repeats() {
        let mut tracker = tracker();
        let first = tracker.next_range(t0()).unwrap();
        tracker.advance(&first);

        let failed = tracker.next_range(t0() + Duration::minutes(5)).unwrap();
        let retried = tracker.next_range(t0() + Duration::minutes(10)).unwrap();
        assert_eq!(failed.start, retried.start);
        assert_eq!(tracker.last_end(), Some(first.end));
    }

    #[test]
    fn degenerate_ranges_are_refused() {
        // Clock went backwards past the last end.
        let last_end = Some(t0());
        assert!(next_range(t0(), last_end, Duration::minutes(5), Duration::seconds(30)).is_none());
        assert!(next_range(
            t0() + Duration::seconds(30),
            last_end,
            Duration::minutes(5),
            Duration::seconds(30)
        )
        .is_none());

        // Buffer larger than the interval on the first cycle.
        assert!(next_range(t0(), None, Duration::seconds(10), Duration::seconds(30)).is_none());
    }

    #[test]
    fn next_range_never_yields_empty_range() {
        let interval = Duration::minutes(1);
        let buffer = Duration::seconds(30);
        for offset_secs in -120..120 {
            let now = t0() + Duration::seconds(offset_secs);
            if let Some(range) = next_range(now, Some(t0()), interval, buffer) {
                assert!(range.start < range.end);
            }
        }
    }
}
