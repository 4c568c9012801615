//! Connection / worker pool: the load-generation engine.
//!
//! Each connection owns one backend client handle and one input shard;
//! `workers_per_connection` tasks drain the shard concurrently. Workers are
//! paced individually — there is no global lock on request issuance — and
//! observe cancellation at every suspension point.
mod worker;


use std::sync::Arc;

use tracing::debug;

use crate::backend::{QueryBackend, QueryTemplate, TemplateChooser};
use crate::input::Shard;
use crate::metrics::RecorderHandle;
use crate::rate::PacingReceiver;
use crate::shutdown::ShutdownSender;

use worker::{WorkerContext, worker_loop};

/// One backend connection plus the shard its workers drain.
pub struct Connection {
    pub id: usize,
    pub backend: Arc<dyn QueryBackend>,
    pub shard: Shard,
}

/// Collaborators shared by every worker in the pool.
#[derive(Clone)]
pub struct EngineContext {
    pub templates: Arc<Vec<QueryTemplate>>,
    pub chooser: Arc<dyn TemplateChooser>,
    pub recorder: RecorderHandle,
    pub pacing_rx: PacingReceiver,
    pub shutdown_tx: ShutdownSender,
    pub workers_per_connection: usize,
}

impl Connection {
    /// Run this connection's workers; returns only after every worker has
    /// exited, by input exhaustion or cancellation.
    pub async fn run(self, ctx: EngineContext) {
        if self.shard.is_empty() {
            debug!("Connection {} received an empty shard.", self.id);
        } else {
            debug!(
                "Connection {} starting {} workers over {} rows.",
                self.id,
                ctx.workers_per_connection,
                self.shard.len()
            );
        }
        let mut handles = Vec::with_capacity(ctx.workers_per_connection);
        for worker_id in 0..ctx.workers_per_connection {
            let worker = WorkerContext {
                connection_id: self.id,
                worker_id,
                backend: Arc::clone(&self.backend),
                templates: Arc::clone(&ctx.templates),
                chooser: Arc::clone(&ctx.chooser),
                shard: self.shard.clone(),
                recorder: ctx.recorder.clone(),
                pacing_rx: ctx.pacing_rx.clone(),
                shutdown_tx: ctx.shutdown_tx.clone(),
            };
            handles.push(tokio::spawn(worker_loop(worker)));
        }
        drop(ctx);
        for handle in handles {
            if handle.await.is_err() {
                debug!("Worker task for connection {} aborted.", self.id);
            }
        }
    }
}

/// Drive every connection to completion. Consumes the context so that all
/// recorder handles owned by the engine are dropped by the time this
/// returns — after that, only the caller's handle keeps the recorder open.
pub async fn run_pool(connections: Vec<Connection>, ctx: EngineContext) {
    let mut handles = Vec::with_capacity(connections.len());
    for connection in connections {
        handles.push(tokio::spawn(connection.run(ctx.clone())));
    }
    drop(ctx);
    for handle in handles {
        if handle.await.is_err() {
            debug!("Connection task aborted.");
        }
    }
}
