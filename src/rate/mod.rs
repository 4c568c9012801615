//! Rate Controller: the single mutable `desired QPS` value and its derived
//! per-worker pacing interval.
//!
//! Mutation happens on exactly one path (the control endpoint task owns the
//! controller); workers only hold watch receivers. A rate change publishes
//! the new interval with `send_replace`, which never blocks regardless of
//! reader progress — a worker that has not drained an earlier signal simply
//! observes the newest interval when it next looks.


use std::time::Duration;

use tokio::sync::watch;

use crate::error::RateError;

/// Cloned into every worker; observed at each pacing wait.
pub type PacingReceiver = watch::Receiver<Duration>;

pub struct RateController {
    qps: u64,
    total_workers: u64,
    pacing_tx: watch::Sender<Duration>,
}

impl RateController {
    /// Build the controller seeded with the initial rate, returning the
    /// pacing receiver the workers clone.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRate` when the initial rate is zero.
    pub fn new(initial_qps: u64, total_workers: usize) -> Result<(Self, PacingReceiver), RateError> {
        if initial_qps == 0 {
            return Err(RateError::InvalidRate {
                requested: 0,
                current: 0,
            });
        }
        let total = u64::try_from(total_workers).unwrap_or(u64::MAX).max(1);
        let (pacing_tx, pacing_rx) = watch::channel(pacing_interval(initial_qps, total));
        Ok((
            Self {
                qps: initial_qps,
                total_workers: total,
                pacing_tx,
            },
            pacing_rx,
        ))
    }

    #[must_use]
    pub const fn current_qps(&self) -> u64 {
        self.qps
    }

    /// The interval currently in force for each worker.
    #[must_use]
    pub fn pacing_interval(&self) -> Duration {
        *self.pacing_tx.borrow()
    }

    /// Replace the desired global rate.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRate` (reporting the unchanged current rate) when the
    /// requested value is not positive.
    pub fn set_qps(&mut self, value: i64) -> Result<u64, RateError> {
        self.apply(i128::from(value))
    }

    /// Raise the desired global rate by `delta`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRate` when the result would not be positive; the
    /// current rate is left untouched.
    pub fn inc_qps(&mut self, delta: i64) -> Result<u64, RateError> {
        self.apply(i128::from(self.qps).saturating_add(i128::from(delta)))
    }

    /// Lower the desired global rate by `delta`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRate` when the result would not be positive; the
    /// current rate is left untouched.
    pub fn dec_qps(&mut self, delta: i64) -> Result<u64, RateError> {
        self.apply(i128::from(self.qps).saturating_sub(i128::from(delta)))
    }

    fn apply(&mut self, requested: i128) -> Result<u64, RateError> {
        if requested <= 0 {
            return Err(RateError::InvalidRate {
                requested: clamp_i64(requested),
                current: self.qps,
            });
        }
        let new_qps = u64::try_from(requested).unwrap_or(u64::MAX);
        self.qps = new_qps;
        self.pacing_tx
            .send_replace(pacing_interval(new_qps, self.total_workers));
        Ok(new_qps)
    }
}

/// Minimum wait between one worker's consecutive calls:
/// `1s × total_workers / desired_qps`, floored at one nanosecond.
#[must_use]
pub fn pacing_interval(qps: u64, total_workers: u64) -> Duration {
    let nanos = 1_000_000_000_u128
        .saturating_mul(u128::from(total_workers.max(1)))
        .checked_div(u128::from(qps.max(1)))
        .unwrap_or(u128::MAX);
    Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX).max(1))
}

const fn clamp_i64(value: i128) -> i64 {
    if value > i64::MAX as i128 {
        i64::MAX
    } else if value < i64::MIN as i128 {
        i64::MIN
    } else {
        value as i64
    }
}
