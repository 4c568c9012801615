use std::sync::Arc;

use tokio::sync::broadcast::error::TryRecvError;
use tokio::time::{Instant, sleep};
use tracing::debug;

use crate::backend::{QueryBackend, QueryTemplate, TemplateChooser};
use crate::input::Shard;
use crate::metrics::{QueryOutcome, RecorderHandle};
use crate::rate::PacingReceiver;
use crate::shutdown::{ShutdownReceiver, ShutdownSender};

pub(super) struct WorkerContext {
    pub(super) connection_id: usize,
    pub(super) worker_id: usize,
    pub(super) backend: Arc<dyn QueryBackend>,
    pub(super) templates: Arc<Vec<QueryTemplate>>,
    pub(super) chooser: Arc<dyn TemplateChooser>,
    pub(super) shard: Shard,
    pub(super) recorder: RecorderHandle,
    pub(super) pacing_rx: PacingReceiver,
    pub(super) shutdown_tx: ShutdownSender,
}

/// One worker slot: dequeue, execute, record, pace, repeat.
///
/// An in-flight call is never interrupted — cancellation and rate changes
/// only win races at the dequeue and pacing suspension points, and the
/// outcome of the current call is always recorded before exit.
pub(super) async fn worker_loop(mut ctx: WorkerContext) {
    let mut shutdown_rx = ctx.shutdown_tx.subscribe();

    loop {
        let line = tokio::select! {
            _ = shutdown_rx.recv() => break,
            line = ctx.shard.pop() => match line {
                Some(line) => line,
                // Shard exhausted and closed: a normal exit.
                None => break,
            },
        };

        let index = ctx.chooser.choose(ctx.templates.len());
        let Some(template) = pick_template(&ctx.templates, index) else {
            continue;
        };

        let start = Instant::now();
        let result = ctx.backend.execute(template, line.fields()).await;
        let outcome = match result {
            Ok(()) => QueryOutcome::success(start.elapsed()),
            Err(err) => QueryOutcome::failure(start.elapsed(), err.signature()),
        };
        ctx.recorder.record(outcome).await;

        match shutdown_rx.try_recv() {
            Err(TryRecvError::Empty) => {}
            Ok(()) | Err(TryRecvError::Closed) | Err(TryRecvError::Lagged(_)) => break,
        }

        if !pace(&mut ctx.pacing_rx, &mut shutdown_rx).await {
            break;
        }
    }

    debug!(
        "Worker {}.{} exiting.",
        ctx.connection_id, ctx.worker_id
    );
}

fn pick_template(templates: &[QueryTemplate], index: usize) -> Option<&QueryTemplate> {
    let picked = templates.get(index);
    if picked.is_none() {
        debug!(
            "Template chooser returned {} for {} templates; skipping row.",
            index,
            templates.len()
        );
    }
    picked
}

/// Wait one pacing interval before the next permitted send slot. A
/// reconfiguration signal discards the running timer and starts a fresh one
/// at the new interval; no call is made for the signal itself. Returns false
/// when cancellation won the race.
async fn pace(pacing_rx: &mut PacingReceiver, shutdown_rx: &mut ShutdownReceiver) -> bool {
    let mut interval = *pacing_rx.borrow_and_update();
    loop {
        tokio::select! {
            _ = shutdown_rx.recv() => return false,
            () = sleep(interval) => return true,
            changed = pacing_rx.changed() => {
                if changed.is_err() {
                    // Rate controller is gone; finish the wait at the last
                    // published interval instead of spinning on a closed
                    // channel.
                    return tokio::select! {
                        _ = shutdown_rx.recv() => false,
                        () = sleep(interval) => true,
                    };
                }
                interval = *pacing_rx.borrow_and_update();
            }
        }
    }
}
