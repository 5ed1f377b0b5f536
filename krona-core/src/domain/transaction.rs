//! Transaction domain model

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A fully validated, typed statement row
///
/// This is the pipeline's externally visible output unit. Callers persist
/// and display these; the pipeline never stores them itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Signed amount in the statement currency
    pub amount: f64,
    pub transaction_day: NaiveDate,
    pub currency: Option<String>,
    /// Counterparty / place of purchase
    pub reference: Option<String>,
    pub description: Option<String>,

    // =========================================================================
    // Derived fields
    // =========================================================================
    /// True for strictly negative amounts; zero counts as income
    pub is_expense: bool,
    /// Predicted spending category
    pub category: String,
    /// Classifier's maximum class probability, when supported
    pub category_confidence: Option<f64>,

    // =========================================================================
    // Extended bank schema (present when the export carries them)
    // =========================================================================
    pub row_number: Option<i64>,
    pub clearing_number: Option<String>,
    pub account_number: Option<String>,
    pub product: Option<String>,
    pub booking_day: Option<NaiveDate>,
    pub value_day: Option<NaiveDate>,
    pub booked_balance: Option<f64>,
}

impl Transaction {
    /// Create a transaction with the required canonical fields
    pub fn new(amount: f64, transaction_day: NaiveDate, category: impl Into<String>) -> Self {
        Self {
            amount,
            transaction_day,
            currency: None,
            reference: None,
            description: None,
            is_expense: amount < 0.0,
            category: category.into(),
            category_confidence: None,
            row_number: None,
            clearing_number: None,
            account_number: None,
            product: None,
            booking_day: None,
            value_day: None,
            booked_balance: None,
        }
    }

    /// Text handed to the category classifier: trimmed description and
    /// reference joined by a single space, empty parts tolerated
    pub fn classifier_text(description: Option<&str>, reference: Option<&str>) -> String {
        let desc = description.unwrap_or("").trim();
        let re = reference.unwrap_or("").trim();
        format!("{} {}", desc, re).trim().to_string()
    }
}
