//! Progress events and the 5% band throttle.

use std::time::Duration;

use tokio::time::Instant;

use super::constants::{PROGRESS_STEP_PERCENT, UNKNOWN_TOTAL_PROGRESS_INTERVAL};
use super::engine::DownloadOutcome;

/// Snapshot of a transfer in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DownloadProgress {
    /// Bytes written to the sink so far.
    pub bytes_transferred: u64,
    /// Declared size, `None` when the server sent no usable `Content-Length`.
    pub total_bytes: Option<u64>,
    /// Always a multiple of 5 in `0..=100`; 0 while the total is unknown.
    pub percent: u8,
}

/// Event delivered to the caller's callback during a download.
#[derive(Debug, Clone, Copy)]
pub enum DownloadEvent<'a> {
    Progress(DownloadProgress),
    /// Emitted exactly once, after the last progress event, on success and failure.
    Finished(&'a DownloadOutcome),
}

/// Integer percentage of `transferred` over `total`, clamped to 100.
///
/// Returns 0 for an unknown or zero total.
#[must_use]
pub fn percent_complete(transferred: u64, total: Option<u64>) -> u8 {
    match total {
        Some(total) if total > 0 => {
            let percent = u128::from(transferred) * 100 / u128::from(total);
            u8::try_from(percent.min(100)).unwrap_or(100)
        }
        _ => 0,
    }
}

/// Decides which progress observations become events.
///
/// With a known total, one event fires per 5% band crossed, in order, each
/// band at most once; a single large chunk jumping from 3% to 17% yields
/// 5, 10 and 15. With an unknown total, an event fires at most once per
/// interval.
#[derive(Debug, Clone)]
pub struct ProgressThrottle {
    next_band: u8,
    interval: Duration,
    last_unknown_emit: Option<Instant>,
}

impl Default for ProgressThrottle {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressThrottle {
    #[must_use]
    pub fn new() -> Self {
        Self::with_interval(UNKNOWN_TOTAL_PROGRESS_INTERVAL)
    }

    /// Uses a custom spacing for unknown-total events.
    #[must_use]
    pub fn with_interval(interval: Duration) -> Self {
        Self {
            next_band: 0,
            interval,
            last_unknown_emit: None,
        }
    }

    /// Records that `transferred` bytes are done and returns the events to emit.
    pub fn observe(
        &mut self,
        transferred: u64,
        total: Option<u64>,
        now: Instant,
    ) -> Vec<DownloadProgress> {
        let total = total.filter(|total| *total > 0);
        let Some(known_total) = total else {
            return self.observe_unknown(transferred, now).into_iter().collect();
        };

        let reached = percent_complete(transferred, Some(known_total));
        let mut events = Vec::new();
        while self.next_band <= reached {
            events.push(DownloadProgress {
                bytes_transferred: transferred,
                total_bytes: Some(known_total),
                percent: self.next_band,
            });
            self.next_band = self.next_band.saturating_add(PROGRESS_STEP_PERCENT);
        }
        events
    }

    fn observe_unknown(&mut self, transferred: u64, now: Instant) -> Option<DownloadProgress> {
        let due = self
            .last_unknown_emit
            .is_none_or(|last| now.saturating_duration_since(last) >= self.interval);
        if !due {
            return None;
        }
        self.last_unknown_emit = Some(now);
        Some(DownloadProgress {
            bytes_transferred: transferred,
            total_bytes: None,
            percent: 0,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn percents(events: &[DownloadProgress]) -> Vec<u8> {
        events.iter().map(|event| event.percent).collect()
    }

    #[test]
    fn test_percent_complete() {
        assert_eq!(percent_complete(0, Some(200)), 0);
        assert_eq!(percent_complete(14, Some(200)), 7);
        assert_eq!(percent_complete(200, Some(200)), 100);
        assert_eq!(percent_complete(500, Some(200)), 100);
        assert_eq!(percent_complete(10, None), 0);
        assert_eq!(percent_complete(10, Some(0)), 0);
        assert_eq!(percent_complete(u64::MAX, Some(u64::MAX)), 100);
    }

    #[test]
    fn test_throttle_fires_only_at_band_boundaries() {
        let mut throttle = ProgressThrottle::new();
        let now = Instant::now();
        let total = Some(1000);
        let mut fired = Vec::new();
        // 7%, 23%, 24%, 51%, 100% in awkward increments.
        for transferred in [0, 70, 230, 240, 510, 999, 1000] {
            fired.extend(percents(&throttle.observe(transferred, total, now)));
        }
        assert_eq!(
            fired,
            vec![
                0, 5, 10, 15, 20, 25, 30, 35, 40, 45, 50, 55, 60, 65, 70, 75, 80, 85, 90, 95, 100
            ]
        );
    }

    #[test]
    fn test_throttle_never_repeats_a_band() {
        let mut throttle = ProgressThrottle::new();
        let now = Instant::now();
        assert_eq!(percents(&throttle.observe(0, Some(100), now)), vec![0]);
        assert!(throttle.observe(1, Some(100), now).is_empty());
        assert!(throttle.observe(4, Some(100), now).is_empty());
        assert_eq!(percents(&throttle.observe(5, Some(100), now)), vec![5]);
        assert!(throttle.observe(9, Some(100), now).is_empty());
    }

    #[test]
    fn test_throttle_skipped_bands_carry_current_bytes() {
        let mut throttle = ProgressThrottle::new();
        let events = throttle.observe(170, Some(1000), Instant::now());
        assert_eq!(percents(&events), vec![0, 5, 10, 15]);
        assert!(events.iter().all(|event| event.bytes_transferred == 170));
        assert!(events.iter().all(|event| event.total_bytes == Some(1000)));
    }

    #[test]
    fn test_throttle_stops_after_hundred() {
        let mut throttle = ProgressThrottle::new();
        let now = Instant::now();
        assert_eq!(throttle.observe(100, Some(100), now).len(), 21);
        assert!(throttle.observe(150, Some(100), now).is_empty());
    }

    #[test]
    fn test_throttle_unknown_total_is_time_based() {
        let mut throttle = ProgressThrottle::with_interval(Duration::from_millis(100));
        let start = Instant::now();

        let first = throttle.observe(10, None, start);
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].percent, 0);
        assert_eq!(first[0].total_bytes, None);

        assert!(throttle.observe(20, None, start + Duration::from_millis(50)).is_empty());

        let later = throttle.observe(30, None, start + Duration::from_millis(100));
        assert_eq!(later.len(), 1);
        assert_eq!(later[0].bytes_transferred, 30);
    }

    #[test]
    fn test_throttle_zero_total_treated_as_unknown() {
        let mut throttle = ProgressThrottle::new();
        let events = throttle.observe(0, Some(0), Instant::now());
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].total_bytes, None);
    }
}
