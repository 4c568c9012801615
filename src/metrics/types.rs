use std::collections::BTreeMap;
use std::time::Duration;

use super::LatencyHistogram;

/// Outcome key recorded for calls that completed without error.
pub const SUCCESS_OUTCOME: &str = "success";

/// The result of one backend call, produced by a worker and consumed exactly
/// once by the recorder.
#[derive(Debug)]
pub struct QueryOutcome {
    pub duration: Duration,
    /// `None` marks success; otherwise a stable error signature.
    pub signature: Option<String>,
}

impl QueryOutcome {
    #[must_use]
    pub const fn success(duration: Duration) -> Self {
        Self {
            duration,
            signature: None,
        }
    }

    #[must_use]
    pub const fn failure(duration: Duration, signature: String) -> Self {
        Self {
            duration,
            signature: Some(signature),
        }
    }

    #[must_use]
    pub fn outcome_key(&self) -> &str {
        self.signature.as_deref().unwrap_or(SUCCESS_OUTCOME)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct LatencySummary {
    pub min_ms: u64,
    pub avg_ms: u64,
    pub p50_ms: u64,
    pub p90_ms: u64,
    pub p99_ms: u64,
    pub max_ms: u64,
}

/// Immutable end-of-run snapshot, valid once every producer has dropped.
#[derive(Debug)]
pub struct RunReport {
    pub elapsed: Duration,
    pub total: u64,
    pub outcomes: BTreeMap<String, u64>,
    pub latency: LatencySummary,
    pub histogram: LatencyHistogram,
}

impl RunReport {
    #[must_use]
    pub fn successes(&self) -> u64 {
        self.outcomes.get(SUCCESS_OUTCOME).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn failures(&self) -> u64 {
        self.total.saturating_sub(self.successes())
    }
}
