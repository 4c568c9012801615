use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Duration value is empty.")]
    DurationEmpty,
    #[error("Invalid duration format: {value} (expected e.g. 500ms, 30s, 5m, 1h)")]
    InvalidDurationFormat { value: String },
    #[error("Invalid duration number in {value}: {source}")]
    InvalidDurationNumber {
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },
    #[error("Invalid duration unit: {unit}")]
    InvalidDurationUnit { unit: String },
    #[error("Duration overflows the supported range.")]
    DurationOverflow,
    #[error("Duration must be greater than zero.")]
    DurationZero,
    #[error("Value must be a positive integer, got {value}")]
    NotPositive { value: String },
    #[error("Delimiter must be a single character, got {value:?}")]
    InvalidDelimiter { value: String },
    #[cfg(test)]
    #[error("Test expectation failed: {message}")]
    TestExpectation { message: &'static str },
    #[cfg(test)]
    #[error("Test expectation failed: {message}: {value}")]
    TestExpectationValue {
        message: &'static str,
        value: String,
    },
}
