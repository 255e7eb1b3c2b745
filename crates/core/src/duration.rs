//! Window duration parsing.
//!
//! Durations are written the way operators already write them in alerting
//! configs: a sequence of `<number><unit>` pairs such as `"30m"`, `"1h30m"`,
//! `"1.5h"` or `"250ms"`.

use std::time::Duration;

use thiserror::Error;

const NANOS_PER_MICRO: u128 = 1_000;
const NANOS_PER_MILLI: u128 = 1_000_000;
const NANOS_PER_SEC: u128 = 1_000_000_000;

/// Reasons a duration string was rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DurationError {
    #[error("empty duration")]
    Empty,

    #[error("negative durations are not supported")]
    Negative,

    #[error("invalid number in \"{0}\"")]
    InvalidNumber(String),

    #[error("missing unit in \"{0}\"")]
    MissingUnit(String),

    #[error("unknown unit \"{unit}\" in \"{input}\"")]
    UnknownUnit { unit: String, input: String },

    #[error("duration \"{0}\" is too large")]
    Overflow(String),
}

/// Parse a duration string into a [`Duration`].
///
/// Units: `ns`, `us` (or `µs`), `ms`, `s`, `m`, `h`. Components can be
/// combined (`"2h30m"`) and may carry a fraction (`"1.5h"`). A lone `"0"` is
/// the zero duration; any other number needs a unit.
pub fn parse_duration(s: &str) -> Result<Duration, DurationError> {
    let input = s.trim();
    let body = input.strip_prefix('+').unwrap_or(input);

    if body.starts_with('-') {
        return Err(DurationError::Negative);
    }
    if body.is_empty() {
        return Err(DurationError::Empty);
    }
    if body == "0" {
        return Ok(Duration::ZERO);
    }

    let mut total: u128 = 0;
    let mut rest = body;

    while !rest.is_empty() {
        let number_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        let (number, tail) = rest.split_at(number_len);
        if number.is_empty() || number == "." {
            return Err(DurationError::InvalidNumber(input.to_string()));
        }

        let unit_len = tail
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(tail.len());
        let (unit, tail) = tail.split_at(unit_len);
        if unit.is_empty() {
            return Err(DurationError::MissingUnit(input.to_string()));
        }

        let unit_nanos = match unit {
            "ns" => 1,
            "us" | "µs" | "μs" => NANOS_PER_MICRO,
            "ms" => NANOS_PER_MILLI,
            "s" => NANOS_PER_SEC,
            "m" => 60 * NANOS_PER_SEC,
            "h" => 3_600 * NANOS_PER_SEC,
            other => {
                return Err(DurationError::UnknownUnit {
                    unit: other.to_string(),
                    input: input.to_string(),
                })
            }
        };

        let component = scale(number, unit_nanos, input)?;
        total = total
            .checked_add(component)
            .ok_or_else(|| DurationError::Overflow(input.to_string()))?;
        rest = tail;
    }

    let nanos = u64::try_from(total).map_err(|_| DurationError::Overflow(input.to_string()))?;
    Ok(Duration::from_nanos(nanos))
}

/// Multiply a decimal literal by a unit expressed in nanoseconds.
fn scale(number: &str, unit_nanos: u128, input: &str) -> Result<u128, DurationError> {
    let invalid = || DurationError::InvalidNumber(input.to_string());
    let (whole, fraction) = number.split_once('.').unwrap_or((number, ""));
    if fraction.contains('.') {
        return Err(invalid());
    }

    let whole: u128 = if whole.is_empty() {
        0
    } else {
        whole.parse().map_err(|_| invalid())?
    };
    let mut nanos = whole
        .checked_mul(unit_nanos)
        .ok_or_else(|| DurationError::Overflow(input.to_string()))?;

    // Digits past nanosecond precision contribute nothing.
    let mut place = unit_nanos;
    for digit in fraction.chars() {
        let digit = digit.to_digit(10).ok_or_else(invalid)?;
        place /= 10;
        nanos += u128::from(digit) * place;
    }

    Ok(nanos)
}
