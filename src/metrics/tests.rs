use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::time::Instant;

use super::{LatencyHistogram, QueryOutcome, SUCCESS_OUTCOME, spawn_recorder};
use crate::error::AppResult;

fn run_async_test<F>(future: F) -> AppResult<()>
where
    F: Future<Output = AppResult<()>>,
{
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(4)
        .enable_all()
        .build()?;
    runtime.block_on(future)
}

#[test]
fn outcome_keys_map_success_and_signatures() {
    let ok = QueryOutcome::success(Duration::from_millis(5));
    assert_eq!(ok.outcome_key(), SUCCESS_OUTCOME);
    let failed = QueryOutcome::failure(Duration::from_millis(5), "timeout".to_owned());
    assert_eq!(failed.outcome_key(), "timeout");
}

#[test]
fn histogram_percentiles_on_known_distribution() -> AppResult<()> {
    let mut histogram = LatencyHistogram::new()?;
    for _ in 0..50 {
        histogram.record(10)?;
    }
    for _ in 0..30 {
        histogram.record(20)?;
    }
    for _ in 0..20 {
        histogram.record(50)?;
    }
    assert_eq!(histogram.count(), 100);
    assert_eq!(histogram.min(), 10);
    assert_eq!(histogram.max(), 50);
    let (p50, p90, p99) = histogram.percentiles();
    assert!(p50 <= 20, "p50={p50}");
    assert!((20..=50).contains(&p90), "p90={p90}");
    assert_eq!(p99, 50);
    Ok(())
}

#[test]
fn empty_histogram_reports_zeroes() -> AppResult<()> {
    let histogram = LatencyHistogram::new()?;
    assert_eq!(histogram.percentiles(), (0, 0, 0));
    assert_eq!(histogram.min(), 0);
    assert!(histogram.linear_buckets(10).is_empty());
    Ok(())
}

#[test]
fn linear_buckets_cover_all_samples() -> AppResult<()> {
    let mut histogram = LatencyHistogram::new()?;
    for value in [1_u64, 5, 9, 40, 77, 100] {
        histogram.record(value)?;
    }
    let buckets = histogram.linear_buckets(10);
    let counted: u64 = buckets.iter().map(|&(_, count)| count).sum();
    assert_eq!(counted, 6);
    Ok(())
}

#[test]
fn concurrent_recording_loses_no_updates() -> AppResult<()> {
    run_async_test(async {
        const WORKERS: usize = 120;
        const PER_WORKER: u64 = 50;

        let completed = Arc::new(AtomicU64::new(0));
        let (recorder, report_handle) =
            spawn_recorder(256, Instant::now(), Arc::clone(&completed));

        let mut tasks = Vec::with_capacity(WORKERS);
        for worker in 0..WORKERS {
            let recorder = recorder.clone();
            tasks.push(tokio::spawn(async move {
                for call in 0..PER_WORKER {
                    // Every third worker alternates an error signature in.
                    let outcome = if worker.checked_rem(3) == Some(0) && call.checked_rem(2) == Some(0)
                    {
                        QueryOutcome::failure(Duration::from_millis(2), "http_500".to_owned())
                    } else {
                        QueryOutcome::success(Duration::from_millis(1))
                    };
                    recorder.record(outcome).await;
                }
            }));
        }
        for task in tasks {
            task.await?;
        }
        drop(recorder);

        let report = report_handle.await??;
        let expected_total = u64::try_from(WORKERS).unwrap_or(0).saturating_mul(PER_WORKER);
        assert_eq!(report.total, expected_total);
        assert_eq!(completed.load(Ordering::Relaxed), expected_total);

        let from_counts = report
            .outcomes
            .values()
            .fold(0_u64, |acc, count| acc.saturating_add(*count));
        assert_eq!(from_counts, expected_total);
        assert_eq!(report.histogram.count(), expected_total);

        // 40 of the 120 workers emit 25 errors each.
        assert_eq!(report.outcomes.get("http_500").copied(), Some(1000));
        assert_eq!(report.successes(), expected_total.saturating_sub(1000));
        assert_eq!(report.failures(), 1000);
        Ok(())
    })
}

#[test]
fn report_without_records_is_well_formed() -> AppResult<()> {
    run_async_test(async {
        let completed = Arc::new(AtomicU64::new(0));
        let (recorder, report_handle) = spawn_recorder(8, Instant::now(), completed);
        drop(recorder);
        let report = report_handle.await??;
        assert_eq!(report.total, 0);
        assert!(report.outcomes.is_empty());
        assert_eq!(report.latency.max_ms, 0);
        Ok(())
    })
}

#[test]
fn tiny_capacity_hint_still_counts_exactly() -> AppResult<()> {
    run_async_test(async {
        let completed = Arc::new(AtomicU64::new(0));
        let (recorder, report_handle) = spawn_recorder(1, Instant::now(), completed);
        let writer = recorder.clone();
        let task = tokio::spawn(async move {
            for _ in 0..500_u32 {
                writer
                    .record(QueryOutcome::success(Duration::from_millis(1)))
                    .await;
            }
        });
        task.await?;
        drop(recorder);
        let report = report_handle.await??;
        assert_eq!(report.total, 500);
        Ok(())
    })
}

#[test]
fn average_latency_is_integer_mean() -> AppResult<()> {
    run_async_test(async {
        let completed = Arc::new(AtomicU64::new(0));
        let (recorder, report_handle) = spawn_recorder(16, Instant::now(), completed);
        for ms in [10_u64, 20, 30, 40] {
            recorder
                .record(QueryOutcome::success(Duration::from_millis(ms)))
                .await;
        }
        drop(recorder);
        let report = report_handle.await??;
        assert_eq!(report.latency.avg_ms, 25);
        assert_eq!(report.latency.min_ms, 10);
        assert_eq!(report.latency.max_ms, 40);
        Ok(())
    })
}
