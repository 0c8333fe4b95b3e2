//! Argument parsing shared by every command that takes a date or a count.

use crate::{Error, Result};
use chrono::NaiveDate;

/// Parse a calendar date written strictly as `YYYY-MM-DD`.
///
/// chrono alone accepts unpadded fields such as `2024-6-1`, so the shape is
/// checked before the calendar validity.
pub fn parse_date(raw: &str) -> Result<NaiveDate> {
    let bytes = raw.as_bytes();
    let shaped = bytes.len() == 10
        && bytes[4] == b'-'
        && bytes[7] == b'-'
        && bytes
            .iter()
            .enumerate()
            .all(|(i, b)| i == 4 || i == 7 || b.is_ascii_digit());

    if !shaped {
        return Err(invalid_date(raw));
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| invalid_date(raw))
}

/// Parse a non-negative dose count written as plain ASCII digits.
pub fn parse_dose_count(raw: &str) -> Result<u32> {
    let invalid = || {
        Error::InvalidInput(format!(
            "'{}' is not a valid number of doses (expected a non-negative integer)",
            raw
        ))
    };

    // u32::from_str also takes a leading '+'
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    raw.parse::<u32>().map_err(|_| invalid())
}

fn invalid_date(raw: &str) -> Error {
    Error::InvalidInput(format!(
        "'{}' is not a valid date (format YYYY-MM-DD)",
        raw
    ))
}
