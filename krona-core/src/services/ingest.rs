//! Ingest service - runs the pipeline end to end
//!
//! Orchestrates parse → normalize → clean → coerce → validate → derive and
//! returns typed transactions. Persistence belongs to the caller; the
//! service's output is the validated row set plus resolution metadata.

use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::config::{fields, IngestProfile};
use crate::domain::result::Result;
use crate::domain::{RawTable, Table, Transaction};
use crate::pipeline::{clean, normalize, numbers, parse, validate};
use crate::ports::Classifier;
use crate::services::TrainingService;

/// Where the service obtains its classifier
enum ClassifierSource {
    /// The process-wide model, bootstrapped on first use
    Shared(TrainingService),
    /// An injected model (callers with their own artifact, tests)
    Fixed(Arc<dyn Classifier>),
}

/// Result of one ingestion run
#[derive(Debug, Serialize)]
pub struct IngestResult {
    pub transactions: Vec<Transaction>,
    /// Encoding candidate that decoded the upload
    pub encoding: String,
    /// Delimiter the table was parsed under
    pub delimiter: char,
    /// Data rows in the parsed table, before cleaning
    pub rows_parsed: usize,
    /// Rows removed as blank or duplicate
    pub rows_dropped: usize,
}

/// Resolved format of an upload, without running derivation
#[derive(Debug, Serialize)]
pub struct DetectedFormat {
    pub encoding: String,
    pub delimiter: char,
    pub raw_headers: Vec<String>,
    pub normalized_headers: Vec<String>,
}

/// Ingestion pipeline service
pub struct IngestService {
    profile: IngestProfile,
    classifier: ClassifierSource,
}

impl IngestService {
    /// Service backed by the shared process-wide classifier
    pub fn new(profile: IngestProfile, training: TrainingService) -> Self {
        Self {
            profile,
            classifier: ClassifierSource::Shared(training),
        }
    }

    /// Service with an externally supplied classifier
    pub fn with_classifier(profile: IngestProfile, classifier: Arc<dyn Classifier>) -> Self {
        Self {
            profile,
            classifier: ClassifierSource::Fixed(classifier),
        }
    }

    pub fn profile(&self) -> &IngestProfile {
        &self.profile
    }

    /// Ingest a CSV file from disk
    pub fn ingest_path(&self, path: &Path) -> Result<IngestResult> {
        let raw = std::fs::read(path)?;
        self.ingest_bytes(&raw)
    }

    /// Ingest an uploaded stream
    pub fn ingest_reader(&self, mut reader: impl Read) -> Result<IngestResult> {
        let mut raw = Vec::new();
        reader.read_to_end(&mut raw)?;
        self.ingest_bytes(&raw)
    }

    /// Ingest raw upload bytes
    pub fn ingest_bytes(&self, raw: &[u8]) -> Result<IngestResult> {
        let table = self.normalized_table(raw)?;
        let required = self.effective_required();
        validate::ensure_required_columns(&table.headers, &required)?;

        let date_columns: Vec<&str> = fields::DATE_FIELDS
            .iter()
            .copied()
            .filter(|f| table.headers.iter().any(|h| h == f))
            .collect();
        let rows_parsed = table.rows.len();
        let cleaned = clean::clean(&table, &date_columns, self.profile.date_format.as_deref());
        let rows_dropped = rows_parsed - cleaned.rows.len();

        let amounts = parse_amount_column(&cleaned)?;
        let balances = parse_balance_column(&cleaned);

        self.validate_completeness(&cleaned, &amounts, &required)?;

        let classifier = self.classifier()?;
        let transactions =
            derive_transactions(&cleaned, &amounts, &balances, classifier.as_ref())?;

        info!(
            rows = transactions.len(),
            encoding = table.encoding,
            delimiter = %table.delimiter,
            "ingestion complete"
        );

        Ok(IngestResult {
            transactions,
            encoding: table.encoding.to_string(),
            delimiter: table.delimiter,
            rows_parsed,
            rows_dropped,
        })
    }

    /// Resolve encoding, delimiter and headers without deriving fields
    pub fn detect(&self, raw: &[u8]) -> Result<DetectedFormat> {
        let parsed = parse::parse_table(raw)?;
        let normalized = normalize::normalize_headers(&parsed.headers, &self.profile.field_mapping);
        Ok(DetectedFormat {
            encoding: parsed.encoding.to_string(),
            delimiter: parsed.delimiter,
            raw_headers: parsed.headers,
            normalized_headers: normalized,
        })
    }

    fn normalized_table(&self, raw: &[u8]) -> Result<RawTable> {
        let mut table = parse::parse_table(raw)?;
        table.headers = normalize::normalize_headers(&table.headers, &self.profile.field_mapping);
        Ok(table)
    }

    /// The caller's required columns, plus the two the output type cannot
    /// exist without
    fn effective_required(&self) -> Vec<String> {
        let mut required = vec![
            fields::AMOUNT.to_string(),
            fields::TRANSACTION_DAY.to_string(),
        ];
        for column in &self.profile.required_columns {
            if !required.contains(column) {
                required.push(column.clone());
            }
        }
        required
    }

    fn validate_completeness(
        &self,
        cleaned: &Table,
        amounts: &[Option<f64>],
        required: &[String],
    ) -> Result<()> {
        for column in required {
            if column == fields::AMOUNT {
                validate::ensure_complete(column, amounts.iter().map(|a| a.is_none()))?;
            } else if fields::DATE_FIELDS.contains(&column.as_str()) {
                let cells = cleaned
                    .column(column)
                    .into_iter()
                    .flatten()
                    .map(|c| c.as_date().is_none());
                validate::ensure_complete(column, cells)?;
            } else {
                let cells = cleaned
                    .column(column)
                    .into_iter()
                    .flatten()
                    .map(|c| c.is_missing());
                validate::ensure_complete(column, cells)?;
            }
        }
        Ok(())
    }

    fn classifier(&self) -> Result<Arc<dyn Classifier>> {
        match &self.classifier {
            ClassifierSource::Shared(training) => {
                let model = training.shared_classifier()?;
                Ok(model as Arc<dyn Classifier>)
            }
            ClassifierSource::Fixed(classifier) => Ok(Arc::clone(classifier)),
        }
    }
}

/// Strict locale parsing of the amount column
fn parse_amount_column(cleaned: &Table) -> Result<Vec<Option<f64>>> {
    let Some(idx) = cleaned.column_index(fields::AMOUNT) else {
        return Ok(vec![None; cleaned.rows.len()]);
    };
    cleaned
        .rows
        .iter()
        .map(|row| numbers::parse_locale_number(fields::AMOUNT, row[idx].as_text()))
        .collect()
}

/// Lenient locale parsing of the optional booked-balance column
fn parse_balance_column(cleaned: &Table) -> Vec<Option<f64>> {
    let Some(idx) = cleaned.column_index(fields::BOOKED_BALANCE) else {
        return vec![None; cleaned.rows.len()];
    };
    cleaned
        .rows
        .iter()
        .map(|row| {
            match numbers::parse_locale_number(fields::BOOKED_BALANCE, row[idx].as_text()) {
                Ok(value) => value,
                Err(_) => {
                    warn!(column = fields::BOOKED_BALANCE, "unparseable balance ignored");
                    None
                }
            }
        })
        .collect()
}

/// Build the validated row set, classifying each row
fn derive_transactions(
    cleaned: &Table,
    amounts: &[Option<f64>],
    balances: &[Option<f64>],
    classifier: &dyn Classifier,
) -> Result<Vec<Transaction>> {
    let text_at = |name: &str| cleaned.column_index(name);
    let tday_idx = text_at(fields::TRANSACTION_DAY);
    let currency_idx = text_at(fields::CURRENCY);
    let reference_idx = text_at(fields::REFERENCE);
    let description_idx = text_at(fields::DESCRIPTION);
    let row_number_idx = text_at(fields::ROW_NUMBER);
    let clearing_idx = text_at(fields::CLEARING_NUMBER);
    let account_idx = text_at(fields::ACCOUNT_NUMBER);
    let product_idx = text_at(fields::PRODUCT);
    let booking_idx = text_at(fields::BOOKING_DAY);
    let value_idx = text_at(fields::VALUE_DAY);

    let text_cell = |row: &[crate::domain::Cell], idx: Option<usize>| {
        idx.and_then(|i| row[i].as_text().map(|s| s.to_string()))
    };
    let date_cell = |row: &[crate::domain::Cell], idx: Option<usize>| {
        idx.and_then(|i| row[i].as_date())
    };

    let mut transactions = Vec::with_capacity(cleaned.rows.len());
    for (i, row) in cleaned.rows.iter().enumerate() {
        // Validation guarantees these; rows violating it cannot reach here
        let Some(amount) = amounts[i] else { continue };
        let Some(transaction_day) = date_cell(row, tday_idx) else {
            continue;
        };

        let reference = text_cell(row, reference_idx);
        let description = text_cell(row, description_idx);

        let text = Transaction::classifier_text(description.as_deref(), reference.as_deref());
        let category = classifier.predict(&text)?;
        let category_confidence = classifier
            .predict_proba(&text)
            .map(|probs| probs.into_iter().fold(f64::NEG_INFINITY, f64::max))
            .filter(|p| p.is_finite());

        let mut tx = Transaction::new(amount, transaction_day, category);
        tx.currency = text_cell(row, currency_idx);
        tx.reference = reference;
        tx.description = description;
        tx.category_confidence = category_confidence;
        tx.row_number = text_cell(row, row_number_idx).and_then(|v| v.parse().ok());
        tx.clearing_number = text_cell(row, clearing_idx);
        tx.account_number = text_cell(row, account_idx);
        tx.product = text_cell(row, product_idx);
        tx.booking_day = date_cell(row, booking_idx);
        tx.value_day = date_cell(row, value_idx);
        tx.booked_balance = balances[i];
        transactions.push(tx);
    }
    Ok(transactions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::result::Error;

    /// Fixed-answer classifier for pipeline tests
    struct StubClassifier {
        labels: Vec<String>,
    }

    impl StubClassifier {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                labels: vec!["Dagligvaror".to_string(), "Övrigt/Okänt".to_string()],
            })
        }
    }

    impl Classifier for StubClassifier {
        fn labels(&self) -> &[String] {
            &self.labels
        }

        fn predict(&self, text: &str) -> Result<String> {
            if text.to_lowercase().contains("ica") {
                Ok("Dagligvaror".to_string())
            } else {
                Ok("Övrigt/Okänt".to_string())
            }
        }

        fn predict_proba(&self, text: &str) -> Option<Vec<f64>> {
            if text.to_lowercase().contains("ica") {
                Some(vec![0.9, 0.1])
            } else {
                Some(vec![0.25, 0.75])
            }
        }
    }

    fn profile(required: &[&str]) -> IngestProfile {
        IngestProfile {
            required_columns: required.iter().map(|r| r.to_string()).collect(),
            ..IngestProfile::default()
        }
    }

    fn service(required: &[&str]) -> IngestService {
        IngestService::with_classifier(profile(required), StubClassifier::new())
    }

    #[test]
    fn test_ingest_happy_path() {
        let csv = "Belopp;Datum;Referens\n-120,50;2026-01-05;ICA Nara\n2500,00;2026-01-01;Lon\n";
        let result = service(&["amount", "transactionday", "reference"])
            .ingest_bytes(csv.as_bytes())
            .unwrap();

        assert_eq!(result.transactions.len(), 2);
        let first = &result.transactions[0];
        assert_eq!(first.amount, -120.5);
        assert!(first.is_expense);
        assert_eq!(first.category, "Dagligvaror");
        assert_eq!(first.category_confidence, Some(0.9));
        let second = &result.transactions[1];
        assert_eq!(second.amount, 2500.0);
        assert!(!second.is_expense);
    }

    #[test]
    fn test_missing_required_columns_reported_together() {
        let csv = "Belopp;Datum\n-1,00;2026-01-05\n";
        let err = service(&["amount", "transactionday", "currency", "reference"])
            .ingest_bytes(csv.as_bytes())
            .unwrap_err();
        match err {
            Error::MissingColumns { columns } => {
                assert_eq!(columns, vec!["currency", "reference"]);
            }
            other => panic!("expected MissingColumns, got {other:?}"),
        }
    }

    #[test]
    fn test_invalid_amount_rejects_the_file() {
        let csv = "Belopp;Datum\n12.34.56;2026-01-05\n";
        let err = service(&["amount", "transactionday"])
            .ingest_bytes(csv.as_bytes())
            .unwrap_err();
        assert!(matches!(err, Error::InvalidNumber { .. }));
    }

    #[test]
    fn test_blank_required_cell_fails_validation() {
        let csv = "Belopp;Datum;Referens\n-1,00;2026-01-05;ICA\n-2,00;2026-01-06;\n";
        let err = service(&["amount", "transactionday", "reference"])
            .ingest_bytes(csv.as_bytes())
            .unwrap_err();
        match err {
            Error::Validation { column, missing } => {
                assert_eq!(column, "reference");
                assert_eq!(missing, 1);
            }
            other => panic!("expected Validation, got {other:?}"),
        }
    }

    #[test]
    fn test_unparseable_date_in_required_column_fails_validation() {
        let csv = "Belopp;Datum\n-1,00;not-a-date\n";
        let err = service(&["amount", "transactionday"])
            .ingest_bytes(csv.as_bytes())
            .unwrap_err();
        match err {
            Error::Validation { column, .. } => assert_eq!(column, "transactionday"),
            other => panic!("expected Validation, got {other:?}"),
        }
    }

    #[test]
    fn test_optional_columns_may_be_absent() {
        // currency/description not required and not present
        let csv = "Belopp;Datum;Referens\n-45,00;2026-01-06;Systembolaget\n";
        let result = service(&["amount", "transactionday", "reference"])
            .ingest_bytes(csv.as_bytes())
            .unwrap();
        assert_eq!(result.transactions[0].currency, None);
        assert_eq!(result.transactions[0].description, None);
    }

    #[test]
    fn test_duplicate_and_blank_rows_dropped() {
        let csv = "Belopp;Datum;Referens\n-1,00;2026-01-05;ICA\n-1,00;2026-01-05;ICA\n;;\n";
        let result = service(&["amount", "transactionday", "reference"])
            .ingest_bytes(csv.as_bytes())
            .unwrap();
        assert_eq!(result.transactions.len(), 1);
        assert_eq!(result.rows_parsed, 3);
        assert_eq!(result.rows_dropped, 2);
    }

    #[test]
    fn test_extended_schema_fields_carried_through() {
        let profile = IngestProfile {
            field_mapping: crate::config::FieldMapping::bank_full(),
            required_columns: vec!["amount".into(), "transactionday".into()],
            date_format: None,
        };
        let service = IngestService::with_classifier(profile, StubClassifier::new());
        let csv = "Radnummer;Kontonummer;Transaktionsdag;Valutadag;Belopp;Bokf\u{f6}rt saldo\n\
                   1;123-456;2026-01-05;2026-01-06;-50,00;1 000,00\n";
        let result = service.ingest_bytes(csv.as_bytes()).unwrap();

        let tx = &result.transactions[0];
        assert_eq!(tx.row_number, Some(1));
        assert_eq!(tx.account_number.as_deref(), Some("123-456"));
        assert_eq!(tx.value_day, chrono::NaiveDate::from_ymd_opt(2026, 1, 6));
        assert_eq!(tx.booked_balance, Some(1000.0));
    }

    #[test]
    fn test_detect_reports_resolution() {
        let csv = "Belopp;Datum;Referens\n-1,00;2026-01-05;ICA\n";
        let detected = service(&["amount"]).detect(csv.as_bytes()).unwrap();
        assert_eq!(detected.delimiter, ';');
        assert_eq!(detected.encoding, "utf-8");
        assert_eq!(detected.raw_headers[0], "Belopp");
        assert_eq!(detected.normalized_headers[0], "amount");
    }

    #[test]
    fn test_ingest_reader_matches_bytes() {
        let csv = "Belopp;Datum;Referens\n-1,00;2026-01-05;ICA\n";
        let via_reader = service(&["amount", "transactionday"])
            .ingest_reader(csv.as_bytes())
            .unwrap();
        let via_bytes = service(&["amount", "transactionday"])
            .ingest_bytes(csv.as_bytes())
            .unwrap();
        assert_eq!(via_reader.transactions, via_bytes.transactions);
    }
}
