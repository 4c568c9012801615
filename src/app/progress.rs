use std::io::{IsTerminal, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crossterm::{
    cursor, queue,
    style::Print,
    terminal::{Clear, ClearType},
};
use tokio::time::Instant;

use crate::shutdown::ShutdownSender;

const RENDER_INTERVAL: Duration = Duration::from_millis(250);

/// Opt-in single-line progress on stderr, re-rendered in place. Silent when
/// stderr is not a terminal so piped output stays clean.
pub(crate) fn setup_progress_indicator(
    run_start: Instant,
    completed: Arc<AtomicU64>,
    shutdown_tx: &ShutdownSender,
) -> tokio::task::JoinHandle<()> {
    let mut shutdown_rx = shutdown_tx.subscribe();

    tokio::spawn(async move {
        if !std::io::stderr().is_terminal() {
            return;
        }

        let mut ticker = tokio::time::interval(RENDER_INTERVAL);

        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => {
                    if render_progress_line(run_start, &completed).is_err() {
                        break;
                    }
                    if finish_progress_line().is_err() {
                        break;
                    }
                    break;
                }
                _ = ticker.tick() => {
                    if render_progress_line(run_start, &completed).is_err() {
                        break;
                    }
                }
            }
        }
    })
}

fn render_progress_line(run_start: Instant, completed: &AtomicU64) -> Result<(), std::io::Error> {
    let elapsed = run_start.elapsed();
    let count = completed.load(Ordering::Relaxed);
    let elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX).max(1);
    // Rate kept in integer tenths to avoid float formatting jitter.
    let rate_x10 = count
        .saturating_mul(10_000)
        .checked_div(elapsed_ms)
        .unwrap_or(0);
    let line = format!(
        "{} queries | {}s elapsed | ~{}.{} qps",
        count,
        elapsed.as_secs(),
        rate_x10.checked_div(10).unwrap_or(0),
        rate_x10.checked_rem(10).unwrap_or(0)
    );

    let mut out = std::io::stderr();
    queue!(
        out,
        cursor::MoveToColumn(0),
        Clear(ClearType::CurrentLine),
        Print(line)
    )?;
    out.flush()
}

fn finish_progress_line() -> Result<(), std::io::Error> {
    let mut out = std::io::stderr();
    queue!(out, Print("\n"))?;
    out.flush()
}
