//! Locale number parsing
//!
//! Swedish bank exports format amounts with space (or non-breaking space)
//! thousands separators and a comma decimal point. After separator cleanup
//! the value must fully match an optional leading minus, digits, and an
//! optional fractional part; anything else is a hard failure naming the
//! offending raw value.

use std::sync::OnceLock;

use regex::Regex;

use crate::domain::result::{Error, Result};

fn number_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^-?\d+(\.\d+)?$").unwrap())
}

/// Parse one locale-formatted numeric cell
///
/// Blank or absent input is an explicit absent value, not zero. `column` is
/// only used for error context.
pub fn parse_locale_number(column: &str, raw: Option<&str>) -> Result<Option<f64>> {
    let Some(raw) = raw else {
        return Ok(None);
    };

    let cleaned = raw
        .replace('\u{a0}', " ")
        .replace(' ', "")
        .replace(',', ".");
    if cleaned.is_empty() {
        return Ok(None);
    }

    if !number_re().is_match(&cleaned) {
        return Err(Error::InvalidNumber {
            column: column.to_string(),
            value: raw.to_string(),
        });
    }

    let value: f64 = cleaned.parse().map_err(|_| Error::InvalidNumber {
        column: column.to_string(),
        value: raw.to_string(),
    })?;
    if !value.is_finite() {
        return Err(Error::InvalidNumber {
            column: column.to_string(),
            value: raw.to_string(),
        });
    }
    Ok(Some(value))
}
