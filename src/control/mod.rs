//! Rate-control endpoint: a minimal HTTP listener accepting
//! `POST /ratelimit` with a `<verb>=<integer>` body.
//!
//! The serving task owns the [`RateController`], so every mutation is
//! serialized through one writer. Rejected commands answer 400 with the
//! unchanged current rate; accepted commands answer with the new rate after
//! the reconfiguration broadcast has been published.
mod command;
mod http;


use serde::Serialize;
use tokio::net::{TcpListener, TcpStream};
use tracing::{error, info, warn};

use crate::rate::RateController;
use crate::shutdown::ShutdownSender;

pub use command::RateCommand;

use http::{read_http_request, write_response};

/// Path the endpoint answers on.
pub const RATE_PATH: &str = "/ratelimit";

#[derive(Serialize)]
struct RateAccepted {
    qps: u64,
}

#[derive(Serialize)]
struct RateRejected<'msg> {
    error: &'msg str,
    qps: u64,
}

/// Serve rate commands until shutdown.
///
/// A bind failure is logged and the run continues without live control; the
/// task then parks until shutdown so the published pacing interval stays
/// alive for the workers.
pub async fn serve(listen: String, controller: RateController, shutdown_tx: ShutdownSender) {
    let listener = match TcpListener::bind(&listen).await {
        Ok(listener) => listener,
        Err(err) => {
            error!(
                "Failed to bind rate-control endpoint on {}: {}; live rate changes disabled.",
                listen, err
            );
            let mut shutdown_rx = shutdown_tx.subscribe();
            drop(shutdown_rx.recv().await);
            return;
        }
    };
    info!("Rate-control endpoint listening on http://{}{}", listen, RATE_PATH);
    serve_listener(listener, controller, shutdown_tx).await;
}

/// Accept loop over an already-bound listener; connections are handled
/// serially by the task that owns the controller.
pub async fn serve_listener(
    listener: TcpListener,
    mut controller: RateController,
    shutdown_tx: ShutdownSender,
) {
    let mut shutdown_rx = shutdown_tx.subscribe();
    loop {
        tokio::select! {
            _ = shutdown_rx.recv() => break,
            accepted = listener.accept() => {
                match accepted {
                    Ok((socket, _peer)) => handle_connection(socket, &mut controller).await,
                    Err(err) => warn!("Control accept failed: {}", err),
                }
            }
        }
    }
}

async fn handle_connection(mut socket: TcpStream, controller: &mut RateController) {
    let request = match read_http_request(&mut socket).await {
        Ok(request) => request,
        Err(err) => {
            respond_rejected(&mut socket, err.status, &err.message, controller.current_qps()).await;
            return;
        }
    };

    if request.method != "POST" || request.path != RATE_PATH {
        respond_rejected(
            &mut socket,
            404,
            "Not found; POST /ratelimit with '<verb>=<integer>'",
            controller.current_qps(),
        )
        .await;
        return;
    }

    let body = match std::str::from_utf8(&request.body) {
        Ok(body) => body,
        Err(_err) => {
            respond_rejected(
                &mut socket,
                400,
                "Request body is not UTF-8",
                controller.current_qps(),
            )
            .await;
            return;
        }
    };

    let command = match body.parse::<RateCommand>() {
        Ok(command) => command,
        Err(err) => {
            respond_rejected(
                &mut socket,
                400,
                &err.to_string(),
                controller.current_qps(),
            )
            .await;
            return;
        }
    };

    match command.apply(controller) {
        Ok(qps) => {
            info!("Rate reconfigured; desired QPS is now {}.", qps);
            respond_accepted(&mut socket, qps).await;
        }
        Err(err) => {
            let current = err.unchanged_rate().unwrap_or_else(|| controller.current_qps());
            respond_rejected(&mut socket, 400, &err.to_string(), current).await;
        }
    }
}

async fn respond_accepted(socket: &mut TcpStream, qps: u64) {
    let body = match serde_json::to_vec(&RateAccepted { qps }) {
        Ok(body) => body,
        Err(err) => {
            warn!("Failed to serialize control response: {}", err);
            return;
        }
    };
    if write_response(socket, 200, &body).await.is_err() {
        // Client went away; nothing to do.
    }
}

async fn respond_rejected(socket: &mut TcpStream, status: u16, message: &str, qps: u64) {
    let body = match serde_json::to_vec(&RateRejected {
        error: message,
        qps,
    }) {
        Ok(body) => body,
        Err(err) => {
            warn!("Failed to serialize control response: {}", err);
            return;
        }
    };
    if write_response(socket, status, &body).await.is_err() {
        // Client went away; nothing to do.
    }
}
