use std::sync::Arc;
use std::sync::atomic::AtomicU64;

use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::backend::{HttpQueryBackend, QueryBackend, UniformChooser};
use crate::config::RunSettings;
use crate::control;
use crate::engine::{Connection, EngineContext, run_pool};
use crate::error::AppResult;
use crate::input;
use crate::metrics::spawn_recorder;
use crate::rate::RateController;
use crate::shutdown_handlers;

use super::{progress, summary};

/// Upper bound on the recorder channel so a huge `--queries` does not
/// preallocate unbounded buffer space; senders block instead of dropping.
const RECORDER_CAPACITY_CAP: usize = 65_536;

/// Top-level lifecycle: load input, build the pool, run to completion or
/// cancellation, seal the recorder, print the report. No backend I/O
/// happens here.
pub(crate) async fn run(settings: RunSettings) -> AppResult<()> {
    info!(
        "Starting load run against {} ({} connections x {} workers, {} initial QPS).",
        settings.backend.url,
        settings.connections,
        settings.workers_per_connection,
        settings.initial_qps
    );

    // Loading. Failures here are fatal: no workers have started and no
    // partial report exists.
    let (shards, dist) = input::distribute(
        &settings.input,
        settings.queries,
        settings.connections,
        settings.delimiter,
        settings.min_fields,
    )?;
    if dist.malformed > 0 {
        warn!("Skipped {} malformed input rows.", dist.malformed);
    }
    if dist.enqueued < settings.queries {
        warn!(
            "Input has only {} usable rows; {} were requested.",
            dist.enqueued, settings.queries
        );
    }
    if dist.truncated {
        info!(
            "Input file holds more rows than the requested {}; extra rows were left unread.",
            settings.queries
        );
    }
    debug!("Shard fill: {:?}", dist.shard_lengths);

    let mut connections = Vec::with_capacity(settings.connections);
    for (id, shard) in shards.into_iter().enumerate() {
        let backend: Arc<dyn QueryBackend> = Arc::new(HttpQueryBackend::build(&settings.backend)?);
        connections.push(Connection { id, backend, shard });
    }

    // Running.
    let (shutdown_tx, _shutdown_rx) = shutdown_handlers::shutdown_channel();
    let signal_task = shutdown_handlers::setup_signal_shutdown_handler(&shutdown_tx);
    let deadline_task = settings
        .duration
        .map(|deadline| shutdown_handlers::setup_deadline_handler(&shutdown_tx, deadline));

    let run_start = Instant::now();
    let completed = Arc::new(AtomicU64::new(0));
    let capacity_hint = usize::try_from(dist.enqueued)
        .unwrap_or(usize::MAX)
        .clamp(1, RECORDER_CAPACITY_CAP);
    let (recorder, report_handle) =
        spawn_recorder(capacity_hint, run_start, Arc::clone(&completed));

    let (controller, pacing_rx) =
        RateController::new(settings.initial_qps, settings.total_workers())?;
    debug!(
        "Per-worker pacing interval starts at {:?}.",
        controller.pacing_interval()
    );
    let mut parked_controller = None;
    let control_task = match settings.control_listen {
        Some(listen) => Some(tokio::spawn(control::serve(
            listen,
            controller,
            shutdown_tx.clone(),
        ))),
        None => {
            // Keep the pacing channel alive for the whole run.
            parked_controller = Some(controller);
            None
        }
    };

    let progress_task = settings
        .progress
        .then(|| progress::setup_progress_indicator(run_start, Arc::clone(&completed), &shutdown_tx));

    let ctx = EngineContext {
        templates: Arc::new(settings.templates),
        chooser: Arc::new(UniformChooser),
        recorder: recorder.clone(),
        pacing_rx,
        shutdown_tx: shutdown_tx.clone(),
        workers_per_connection: settings.workers_per_connection,
    };
    run_pool(connections, ctx).await;

    // Draining is over once run_pool returns; stop the auxiliary tasks and
    // seal the recorder by dropping the last producer handle.
    drop(shutdown_tx.send(()));
    drop(recorder);
    drop(parked_controller);

    if let Some(task) = progress_task {
        drop(task.await);
    }
    if let Some(task) = control_task {
        drop(task.await);
    }
    if let Some(task) = deadline_task {
        drop(task.await);
    }
    drop(signal_task.await);

    let report = report_handle.await??;
    summary::print_report(&report, &dist);
    Ok(())
}
