use hdrhistogram::Histogram;

use crate::error::MetricsError;

/// Millisecond latency histogram at three significant digits, auto-resizing
/// so tail precision may be approximate while counts stay exact.
#[derive(Debug)]
pub struct LatencyHistogram {
    hist: Histogram<u64>,
}

impl LatencyHistogram {
    /// Create a new latency histogram.
    ///
    /// # Errors
    ///
    /// Returns an error if the histogram cannot be created.
    pub fn new() -> Result<Self, MetricsError> {
        let hist = Histogram::<u64>::new(3).map_err(|err| MetricsError::Histogram {
            context: "create",
            source: Box::new(err),
        })?;
        Ok(Self { hist })
    }

    /// Record a latency value in milliseconds.
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be recorded.
    pub fn record(&mut self, latency_ms: u64) -> Result<(), MetricsError> {
        self.hist
            .record(latency_ms.max(1))
            .map_err(|err| MetricsError::Histogram {
                context: "record",
                source: Box::new(err),
            })
    }

    #[must_use]
    pub fn count(&self) -> u64 {
        self.hist.len()
    }

    #[must_use]
    pub fn percentiles(&self) -> (u64, u64, u64) {
        if self.count() == 0 {
            return (0, 0, 0);
        }
        (
            self.hist.value_at_quantile(0.5),
            self.hist.value_at_quantile(0.9),
            self.hist.value_at_quantile(0.99),
        )
    }

    #[must_use]
    pub fn min(&self) -> u64 {
        if self.count() == 0 { 0 } else { self.hist.min() }
    }

    #[must_use]
    pub fn max(&self) -> u64 {
        self.hist.max()
    }

    /// Evenly-spaced `(upper_bound_ms, count)` rows for the text histogram.
    #[must_use]
    pub fn linear_buckets(&self, rows: usize) -> Vec<(u64, u64)> {
        if self.count() == 0 || rows == 0 {
            return Vec::new();
        }
        let step = self
            .max()
            .checked_div(u64::try_from(rows).unwrap_or(1).max(1))
            .unwrap_or(1)
            .max(1);
        self.hist
            .iter_linear(step)
            .map(|value| {
                (
                    value.value_iterated_to(),
                    value.count_since_last_iteration(),
                )
            })
            .collect()
    }
}
