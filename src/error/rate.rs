use thiserror::Error;

#[derive(Debug, Error)]
pub enum RateError {
    #[error("QPS cannot go below 1 (requested change to {requested}, current QPS is {current})")]
    InvalidRate { requested: i64, current: u64 },
    #[error("Malformed rate command: {reason}; expected '<verb>=<integer>' with verb in [set|inc|dec]")]
    MalformedCommand { reason: String },
}

impl RateError {
    /// The rate left in place by the rejected operation, when known.
    #[must_use]
    pub const fn unchanged_rate(&self) -> Option<u64> {
        match self {
            RateError::InvalidRate { current, .. } => Some(*current),
            RateError::MalformedCommand { .. } => None,
        }
    }
}
