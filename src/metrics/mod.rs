//! Metrics aggregation: outcome types, the latency histogram, and the
//! single-owner recorder task all workers feed.
mod histogram;
mod recorder;
mod types;

#[cfg(test)]
mod tests;

pub use histogram::LatencyHistogram;
pub use recorder::{RecorderHandle, spawn_recorder};
pub use types::{LatencySummary, QueryOutcome, RunReport, SUCCESS_OUTCOME};
