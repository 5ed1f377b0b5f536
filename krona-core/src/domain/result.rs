//! Result and error types for the core library

use thiserror::Error;

/// Core library error type
///
/// Every pipeline stage fails with a named variant carrying the context a
/// caller needs to explain the failure: attempted encodings, the offending
/// raw value, the full list of missing columns. No stage substitutes a
/// default value for a required field.
#[derive(Error, Debug)]
pub enum Error {
    /// No candidate encoding decoded the source, or the source was empty
    #[error("could not decode input: {}", .attempted.join("; "))]
    Decode { attempted: Vec<String> },

    /// No encoding/delimiter combination produced a multi-column table
    #[error("{}", parse_message(.encoding, .delimiter, .sample, .delimiter_in_value))]
    Parse {
        encoding: String,
        delimiter: char,
        /// A few offending values from the best single-column attempt
        sample: Vec<String>,
        /// Set when the tried delimiter occurs inside a single-column value
        delimiter_in_value: bool,
    },

    /// One or more required canonical columns absent after normalization
    #[error("missing required columns: {}", .columns.join(", "))]
    MissingColumns { columns: Vec<String> },

    /// A numeric field's raw text does not match the locale number grammar
    #[error("invalid number {value:?} in column '{column}'")]
    InvalidNumber { column: String, value: String },

    /// A required column retains missing/invalid values after coercion
    #[error("column '{column}' has {missing} missing or invalid value(s)")]
    Validation { column: String, missing: usize },

    /// The category model could not be loaded or trained
    #[error("category classifier unavailable: {0}")]
    ClassifierUnavailable(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl Error {
    /// Create a classifier-unavailable error
    pub fn classifier(msg: impl Into<String>) -> Self {
        Self::ClassifierUnavailable(msg.into())
    }
}

/// Human-readable message for a parse failure, naming what was attempted
fn parse_message(encoding: &str, delimiter: &char, sample: &[String], delimiter_in_value: &bool) -> String {
    let mut msg = format!(
        "could not parse a table with any encoding/delimiter (last tried {} with {:?})",
        encoding, delimiter
    );
    if !sample.is_empty() {
        msg.push_str(&format!("; offending values: {:?}", sample));
    }
    if *delimiter_in_value {
        msg.push_str(
            "; the delimiter appears inside a single-column value, so the separator guess is likely wrong",
        );
    }
    msg
}

/// Core library result type
pub type Result<T> = std::result::Result<T, Error>;
