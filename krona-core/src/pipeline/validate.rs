//! Schema validation
//!
//! Two checks, both hard failures: every required canonical column must be
//! present after normalization (all absentees reported at once), and every
//! required column must be fully populated after type coercion.

use crate::domain::result::{Error, Result};

/// Required columns absent from the normalized header set
pub fn missing_required(headers: &[String], required: &[String]) -> Vec<String> {
    required
        .iter()
        .filter(|r| !headers.iter().any(|h| h == *r))
        .cloned()
        .collect()
}

/// Fail with every absent required column, not just the first
pub fn ensure_required_columns(headers: &[String], required: &[String]) -> Result<()> {
    let missing = missing_required(headers, required);
    if missing.is_empty() {
        Ok(())
    } else {
        Err(Error::MissingColumns { columns: missing })
    }
}

/// Fail when a required column still holds missing/invalid values
///
/// `missing_flags` yields one flag per row, true for a missing cell.
pub fn ensure_complete(column: &str, missing_flags: impl Iterator<Item = bool>) -> Result<()> {
    let missing = missing_flags.filter(|m| *m).count();
    if missing == 0 {
        Ok(())
    } else {
        Err(Error::Validation {
            column: column.to_string(),
            missing,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owned(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_reports_all_missing_columns_at_once() {
        let headers = owned(&["amount"]);
        let required = owned(&["amount", "transactionday", "currency", "reference", "description"]);
        let err = ensure_required_columns(&headers, &required).unwrap_err();
        match err {
            Error::MissingColumns { columns } => {
                assert_eq!(
                    columns,
                    owned(&["transactionday", "currency", "reference", "description"])
                );
            }
            other => panic!("expected MissingColumns, got {other:?}"),
        }
    }

    #[test]
    fn test_all_present_passes() {
        let headers = owned(&["amount", "transactionday", "extra"]);
        let required = owned(&["amount", "transactionday"]);
        assert!(ensure_required_columns(&headers, &required).is_ok());
    }

    #[test]
    fn test_complete_column_passes() {
        assert!(ensure_complete("amount", [false, false].into_iter()).is_ok());
        assert!(ensure_complete("amount", std::iter::empty()).is_ok());
    }

    #[test]
    fn test_incomplete_column_names_itself_and_counts() {
        let err = ensure_complete("currency", [false, true, true].into_iter()).unwrap_err();
        match err {
            Error::Validation { column, missing } => {
                assert_eq!(column, "currency");
                assert_eq!(missing, 2);
            }
            other => panic!("expected Validation, got {other:?}"),
        }
    }
}
