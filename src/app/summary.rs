use crate::input::DistributionSummary;
use crate::metrics::RunReport;

const HISTOGRAM_ROWS: usize = 12;
const BAR_WIDTH: u64 = 40;

pub(crate) fn print_report(report: &RunReport, dist: &DistributionSummary) {
    let elapsed_ms = u64::try_from(report.elapsed.as_millis())
        .unwrap_or(u64::MAX)
        .max(1);
    let avg_rate_x100 = report
        .total
        .saturating_mul(100_000)
        .checked_div(elapsed_ms)
        .unwrap_or(0);

    println!();
    println!("========================= Load Test Report =========================");
    println!(
        "Elapsed: {}.{:03}s",
        report.elapsed.as_secs(),
        report.elapsed.subsec_millis()
    );
    println!(
        "Rows distributed: {} ({} malformed skipped)",
        dist.enqueued, dist.malformed
    );
    println!(
        "Total queries: {} ({} ok / {} failed)",
        report.total,
        report.successes(),
        report.failures()
    );
    println!(
        "Average rate: {}.{:02} qps",
        avg_rate_x100.checked_div(100).unwrap_or(0),
        avg_rate_x100.checked_rem(100).unwrap_or(0)
    );
    println!();
    println!(
        "Latency (ms): min {} | avg {} | p50 {} | p90 {} | p99 {} | max {}",
        report.latency.min_ms,
        report.latency.avg_ms,
        report.latency.p50_ms,
        report.latency.p90_ms,
        report.latency.p99_ms,
        report.latency.max_ms
    );
    println!();
    println!("Outcome distribution:");
    for (key, count) in &report.outcomes {
        println!("  [{}]: {}", key, count);
    }

    let buckets = report.histogram.linear_buckets(HISTOGRAM_ROWS);
    let tallest = buckets.iter().map(|&(_, count)| count).max().unwrap_or(0);
    if tallest > 0 {
        println!();
        println!("Latency histogram (ms):");
        for (upper, count) in buckets {
            println!(
                "  {:>8} [{:>8}] |{}",
                upper,
                count,
                bar(count, tallest, BAR_WIDTH)
            );
        }
    }
    println!("====================================================================");
}

fn bar(count: u64, tallest: u64, width: u64) -> String {
    let filled = count
        .saturating_mul(width)
        .checked_div(tallest.max(1))
        .unwrap_or(0)
        .min(width);
    "∎".repeat(usize::try_from(filled).unwrap_or(0))
}
