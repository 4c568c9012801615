mod app;
mod args;
mod backend;
mod config;
mod control;
mod engine;
mod entry;
mod error;
mod input;
mod logger;
mod metrics;
mod rate;
mod shutdown;
mod shutdown_handlers;

use error::AppResult;

fn main() -> AppResult<()> {
    entry::run()
}
