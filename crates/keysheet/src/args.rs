//! Coercion of keyword arguments
//!
//! The host passes every argument as text. These helpers turn that text into
//! the typed values a [`Session`](crate::Session) takes.

use chrono::NaiveDate;

use crate::error::{Error, Result};

/// chrono pattern for the `MM-dd-yyyy` dates keywords accept
pub const DATE_INPUT_PATTERN: &str = "%m-%d-%Y";

/// Row or column index: a non-negative integer
pub fn parse_index(name: &str, value: &str) -> Result<u32> {
    let trimmed = value.trim();
    match trimmed.parse::<i64>() {
        Ok(n) if n < 0 => Err(Error::invalid_argument(format!(
            "{} must not be negative, got {}",
            name, n
        ))),
        Ok(n) => u32::try_from(n).map_err(|_| {
            Error::invalid_argument(format!("{} {} is out of range", name, n))
        }),
        Err(_) => Err(Error::invalid_argument(format!(
            "{} must be an integer, got '{}'",
            name, value
        ))),
    }
}

/// Finite decimal number
pub fn parse_number(value: &str) -> Result<f64> {
    match value.trim().parse::<f64>() {
        Ok(n) if n.is_finite() => Ok(n),
        _ => Err(Error::parse(format!("'{}' is not a number", value))),
    }
}

/// `true` or `false`, ignoring case
pub fn parse_bool(value: &str) -> Result<bool> {
    let trimmed = value.trim();
    if trimmed.eq_ignore_ascii_case("true") {
        Ok(true)
    } else if trimmed.eq_ignore_ascii_case("false") {
        Ok(false)
    } else {
        Err(Error::parse(format!("'{}' is not a boolean", value)))
    }
}

/// Host truthiness: `false`, `no`, `off`, `0`, `none` and the empty string
/// are false, anything else is true
pub fn parse_flag(value: &str) -> bool {
    let trimmed = value.trim().to_ascii_lowercase();
    !matches!(trimmed.as_str(), "" | "false" | "no" | "off" | "0" | "none")
}

/// Date in `MM-dd-yyyy` form
pub fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_INPUT_PATTERN).map_err(|e| {
        Error::parse(format!(
            "'{}' is not a date in MM-dd-yyyy form: {}",
            value, e
        ))
    })
}
