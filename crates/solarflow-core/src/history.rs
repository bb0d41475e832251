//! Bounded, rate-limited consumption history.
//!
//! The dashboard shows a short trend of house consumption. Samples arrive
//! on every telemetry push, which can be several times a second, so the
//! history only accepts a sample once the minimum spacing has elapsed since
//! the last accepted one. The oldest samples are evicted once the capacity
//! is exceeded.
//!
//! With the defaults (240 samples, 30 s spacing) the history covers two
//! hours.

use std::collections::VecDeque;
use std::time::Duration;

use time::OffsetDateTime;
use tracing::trace;

use solarflow_types::HistorySample;

/// Default number of samples retained.
pub const DEFAULT_CAPACITY: usize = 240;

/// Default minimum spacing between accepted samples.
pub const DEFAULT_MIN_INTERVAL: Duration = Duration::from_secs(30);

/// Rolling history of house consumption samples, oldest first.
#[derive(Debug, Clone)]
pub struct ConsumptionHistory {
    samples: VecDeque<HistorySample>,
    capacity: usize,
    min_interval: Duration,
    last_accepted: Option<OffsetDateTime>,
}

impl Default for ConsumptionHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl ConsumptionHistory {
    /// History with the default capacity and spacing.
    pub fn new() -> Self {
        Self::with_limits(DEFAULT_CAPACITY, DEFAULT_MIN_INTERVAL)
    }

    /// History with explicit limits. A capacity of zero is raised to one.
    pub fn with_limits(capacity: usize, min_interval: Duration) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
            min_interval,
            last_accepted: None,
        }
    }

    /// Offer a sample. Returns `true` when it was kept.
    ///
    /// A sample is kept when no sample has been kept yet or when at least
    /// the minimum spacing has passed since the last kept one. A timestamp
    /// earlier than the last kept sample is rejected.
    pub fn record(&mut self, now: OffsetDateTime, watts: i64) -> bool {
        if let Some(last) = self.last_accepted {
            // Negative spans fail the conversion and count as too soon.
            let elapsed = Duration::try_from(now - last).unwrap_or(Duration::ZERO);
            if now < last || elapsed < self.min_interval {
                trace!(?elapsed, "Skipping history sample, too soon");
                return false;
            }
        }

        self.samples.push_back(HistorySample {
            timestamp: now,
            watts,
        });
        self.last_accepted = Some(now);

        while self.samples.len() > self.capacity {
            self.samples.pop_front();
        }
        true
    }

    /// Number of retained samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Maximum number of retained samples.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Minimum spacing between kept samples.
    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Samples, oldest first.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &HistorySample> + ExactSizeIterator {
        self.samples.iter()
    }

    /// Sample values in watts, oldest first.
    pub fn values(&self) -> Vec<i64> {
        self.samples.iter().map(|s| s.watts).collect()
    }

    /// Most recent sample.
    pub fn latest(&self) -> Option<&HistorySample> {
        self.samples.back()
    }

    /// Mean consumption rounded to the nearest watt.
    pub fn average(&self) -> Option<i64> {
        if self.samples.is_empty() {
            return None;
        }
        let sum: i128 = self.samples.iter().map(|s| i128::from(s.watts)).sum();
        let mean = sum as f64 / self.samples.len() as f64;
        Some(mean.round() as i64)
    }

    /// Lowest sample value.
    pub fn min(&self) -> Option<i64> {
        self.samples.iter().map(|s| s.watts).min()
    }

    /// Highest sample value.
    pub fn max(&self) -> Option<i64> {
        self.samples.iter().map(|s| s.watts).max()
    }

    /// Drop every sample and forget the spacing anchor.
    pub fn clear(&mut self) {
        self.samples.clear();
        self.last_accepted = None;
    }
}
