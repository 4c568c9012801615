use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::warn;

use crate::error::AppResult;

use super::{LatencyHistogram, LatencySummary, QueryOutcome, RunReport};

/// Cloneable producer half of the recorder. `record` awaits channel space,
/// so a full channel applies backpressure instead of dropping outcomes —
/// occurrence counts stay exact no matter the capacity hint.
#[derive(Clone)]
pub struct RecorderHandle {
    tx: mpsc::Sender<QueryOutcome>,
}

impl RecorderHandle {
    pub async fn record(&self, outcome: QueryOutcome) {
        if self.tx.send(outcome).await.is_err() {
            warn!("Recorder task is gone; outcome dropped.");
        }
    }
}

/// Spawn the single aggregator task that owns all recorder state.
///
/// The task drains the channel until every [`RecorderHandle`] has dropped,
/// then seals the run into an immutable [`RunReport`] — snapshotting before
/// writers stop is impossible by construction. `capacity_hint` sizes the
/// channel to the expected total request count; `completed` is shared with
/// the progress reporter.
#[must_use]
pub fn spawn_recorder(
    capacity_hint: usize,
    run_start: Instant,
    completed: Arc<AtomicU64>,
) -> (RecorderHandle, JoinHandle<AppResult<RunReport>>) {
    let (tx, mut rx) = mpsc::channel::<QueryOutcome>(capacity_hint.max(1));

    let handle = tokio::spawn(async move {
        let mut histogram = LatencyHistogram::new()?;
        let mut outcomes: BTreeMap<String, u64> = BTreeMap::new();
        let mut latency_sum_ms: u128 = 0;

        while let Some(outcome) = rx.recv().await {
            let latency_ms = u64::try_from(outcome.duration.as_millis()).unwrap_or(u64::MAX);
            if let Err(err) = histogram.record(latency_ms) {
                warn!("Failed to record latency: {}", err);
            }
            latency_sum_ms = latency_sum_ms.saturating_add(u128::from(latency_ms));
            let counter = outcomes.entry(outcome.outcome_key().to_owned()).or_insert(0);
            *counter = counter.saturating_add(1);
            completed.fetch_add(1, Ordering::Relaxed);
        }

        let elapsed = run_start.elapsed();
        let total = outcomes
            .values()
            .fold(0_u64, |acc, count| acc.saturating_add(*count));
        let (p50_ms, p90_ms, p99_ms) = histogram.percentiles();
        let avg = latency_sum_ms
            .checked_div(u128::from(total.max(1)))
            .unwrap_or(0);
        let latency = LatencySummary {
            min_ms: histogram.min(),
            avg_ms: u64::try_from(avg).unwrap_or(u64::MAX),
            p50_ms,
            p90_ms,
            p99_ms,
            max_ms: histogram.max(),
        };

        Ok(RunReport {
            elapsed,
            total,
            outcomes,
            latency,
            histogram,
        })
    });

    (RecorderHandle { tx }, handle)
}
