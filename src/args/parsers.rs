use std::time::Duration;

use crate::error::{AppError, AppResult, ValidationError};

pub fn parse_positive_u64(s: &str) -> AppResult<u64> {
    let value: u64 = s.trim().parse().map_err(|_err| {
        AppError::validation(ValidationError::NotPositive {
            value: s.to_owned(),
        })
    })?;
    if value == 0 {
        return Err(AppError::validation(ValidationError::NotPositive {
            value: s.to_owned(),
        }));
    }
    Ok(value)
}

pub fn parse_positive_usize(s: &str) -> AppResult<usize> {
    let value: usize = s.trim().parse().map_err(|_err| {
        AppError::validation(ValidationError::NotPositive {
            value: s.to_owned(),
        })
    })?;
    if value == 0 {
        return Err(AppError::validation(ValidationError::NotPositive {
            value: s.to_owned(),
        }));
    }
    Ok(value)
}

/// Accepts a single character, or the escapes `\t`, `\0` and `,`-style
/// literals, so a tab delimiter survives shell quoting.
pub fn parse_delimiter(s: &str) -> AppResult<char> {
    match s {
        "\\t" | "\t" => return Ok('\t'),
        "\\0" => return Ok('\0'),
        _ => {}
    }
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(ch), None) => Ok(ch),
        (_, _) => Err(AppError::validation(ValidationError::InvalidDelimiter {
            value: s.to_owned(),
        })),
    }
}

pub fn parse_duration_arg(s: &str) -> AppResult<Duration> {
    let value = s.trim();
    if value.is_empty() {
        return Err(AppError::validation(ValidationError::DurationEmpty));
    }

    let mut digits_len = 0usize;
    for ch in value.chars() {
        if ch.is_ascii_digit() {
            digits_len = digits_len.saturating_add(1);
        } else {
            break;
        }
    }
    if digits_len == 0 {
        return Err(AppError::validation(
            ValidationError::InvalidDurationFormat {
                value: value.to_owned(),
            },
        ));
    }
    let (num_part, unit_part) = value.split_at(digits_len);
    let number: u64 = num_part.parse().map_err(|err| {
        AppError::validation(ValidationError::InvalidDurationNumber {
            value: value.to_owned(),
            source: err,
        })
    })?;

    let unit = if unit_part.is_empty() { "s" } else { unit_part };
    let duration = match unit {
        "ms" => Duration::from_millis(number),
        "s" => Duration::from_secs(number),
        "m" => {
            let secs = number
                .checked_mul(60)
                .ok_or_else(|| AppError::validation(ValidationError::DurationOverflow))?;
            Duration::from_secs(secs)
        }
        "h" => {
            let secs = number
                .checked_mul(60)
                .and_then(|seconds| seconds.checked_mul(60))
                .ok_or_else(|| AppError::validation(ValidationError::DurationOverflow))?;
            Duration::from_secs(secs)
        }
        _ => {
            return Err(AppError::validation(ValidationError::InvalidDurationUnit {
                unit: unit.to_owned(),
            }));
        }
    };

    if duration.as_millis() == 0 {
        return Err(AppError::validation(ValidationError::DurationZero));
    }

    Ok(duration)
}
