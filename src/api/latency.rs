//! In-memory latency histogram for normalizer requests.

use std::sync::Mutex;
use std::time::Duration;

use hdrhistogram::Histogram;

use crate::error::Result;

/// Values stored in microseconds.
pub struct LatencyStats {
    inner: Mutex<Histogram<u64>>,
}

impl LatencyStats {
    /// Tracks 1us to 100s, 3 significant figures.
    pub fn new() -> Result<Self> {
        let histogram = Histogram::new_with_bounds(1, 100_000_000, 3)?;
        Ok(Self {
            inner: Mutex::new(histogram),
        })
    }

    pub fn record(&self, d: Duration) {
        let us = d.as_micros().clamp(1, 100_000_000) as u64;
        if let Ok(mut h) = self.inner.lock() {
            // Clamped into bounds above, so this cannot fail.
            let _ = h.record(us);
        }
    }

    /// Return (p50_us, p95_us, p99_us). None if no samples.
    pub fn percentiles(&self) -> (Option<u64>, Option<u64>, Option<u64>) {
        let Ok(h) = self.inner.lock() else {
            return (None, None, None);
        };
        if h.len() == 0 {
            return (None, None, None);
        }
        (
            Some(h.value_at_quantile(0.5)),
            Some(h.value_at_quantile(0.95)),
            Some(h.value_at_quantile(0.99)),
        )
    }

    pub fn len(&self) -> u64 {
        self.inner.lock().map(|h| h.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
