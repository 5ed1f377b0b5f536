//! Configuration management
//!
//! Settings live in `settings.json` inside the krona directory:
//! ```json
//! {
//!   "ingestProfiles": { "swedbank": { "fieldMapping": [...], ... } },
//!   "model": { "artifact": "category_model.json", ... }
//! }
//! ```
//! Keys the library does not manage are preserved on save.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Canonical field names guaranteed to downstream consumers
pub mod fields {
    pub const AMOUNT: &str = "amount";
    pub const TRANSACTION_DAY: &str = "transactionday";
    pub const CURRENCY: &str = "currency";
    pub const REFERENCE: &str = "reference";
    pub const DESCRIPTION: &str = "description";

    // Extended bank schema
    pub const ROW_NUMBER: &str = "row_number";
    pub const CLEARING_NUMBER: &str = "clearing_number";
    pub const ACCOUNT_NUMBER: &str = "account_number";
    pub const PRODUCT: &str = "product";
    pub const BOOKING_DAY: &str = "booking_day";
    pub const VALUE_DAY: &str = "value_day";
    pub const BOOKED_BALANCE: &str = "booked_balance";

    /// Canonical columns the cleaner coerces to dates
    pub const DATE_FIELDS: [&str; 3] = [TRANSACTION_DAY, BOOKING_DAY, VALUE_DAY];
}

/// One canonical field and the header spellings that map onto it
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldRule {
    pub canonical: String,
    pub variants: Vec<String>,
}

/// Mapping from canonical field names to accepted header variants
///
/// Declaration order is evaluation order: on a similarity tie the first
/// declared canonical name wins. Canonical names must be unique.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldMapping {
    rules: Vec<FieldRule>,
}

impl FieldMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one canonical field with its accepted variants
    pub fn with(mut self, canonical: &str, variants: &[&str]) -> Self {
        debug_assert!(
            !self.rules.iter().any(|r| r.canonical == canonical),
            "duplicate canonical field {canonical}"
        );
        self.rules.push(FieldRule {
            canonical: canonical.to_string(),
            variants: variants.iter().map(|v| v.to_string()).collect(),
        });
        self
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FieldRule> {
        self.rules.iter()
    }

    pub fn canonical_names(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(|r| r.canonical.as_str())
    }

    /// The five-field mapping most bank exports reduce to
    pub fn standard() -> Self {
        Self::new()
            .with(fields::AMOUNT, &["Belopp", "Priset", "amount"])
            .with(
                fields::TRANSACTION_DAY,
                &["Transaktionsdag", "Datum", "date", "transaction_day", "Valutadag"],
            )
            .with(fields::CURRENCY, &["Valuta", "currency"])
            .with(fields::REFERENCE, &["reference", "ref", "reference_number", "Referens"])
            .with(
                fields::DESCRIPTION,
                &["description", "Beskrivning", "description_of_transaction"],
            )
    }

    /// The full Swedbank-style export schema
    pub fn bank_full() -> Self {
        Self::new()
            .with(fields::AMOUNT, &["Belopp", "amount"])
            .with(
                fields::TRANSACTION_DAY,
                &["Transaktionsdag", "Datum", "date", "transaction_day"],
            )
            .with(fields::CURRENCY, &["Valuta", "currency"])
            .with(fields::REFERENCE, &["Referens", "reference"])
            .with(fields::DESCRIPTION, &["Beskrivning", "description"])
            .with(fields::ROW_NUMBER, &["Radnummer", "row_number"])
            .with(fields::CLEARING_NUMBER, &["Clearingnummer", "clearing_number"])
            .with(fields::ACCOUNT_NUMBER, &["Kontonummer", "account_number"])
            .with(fields::PRODUCT, &["Produkt", "product"])
            .with(fields::BOOKING_DAY, &["Bokföringsdag", "booking_day"])
            .with(fields::VALUE_DAY, &["Valutadag", "value_day"])
            .with(fields::BOOKED_BALANCE, &["Bokfört saldo", "booked_balance"])
    }
}

/// One named ingestion configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestProfile {
    pub field_mapping: FieldMapping,
    /// Canonical columns that must be present and fully populated
    pub required_columns: Vec<String>,
    /// Date format tried before the built-in ones
    #[serde(default)]
    pub date_format: Option<String>,
}

impl Default for IngestProfile {
    fn default() -> Self {
        Self {
            field_mapping: FieldMapping::standard(),
            required_columns: vec![
                fields::AMOUNT.to_string(),
                fields::TRANSACTION_DAY.to_string(),
                fields::CURRENCY.to_string(),
                fields::REFERENCE.to_string(),
                fields::DESCRIPTION.to_string(),
            ],
            date_format: None,
        }
    }
}

/// Filesystem locations of the classifier artifacts
#[derive(Debug, Clone)]
pub struct ModelPaths {
    /// Serialized classifier pipeline
    pub artifact: PathBuf,
    /// Line-delimited training records
    pub training_data: PathBuf,
    /// Rule table override; the bundled table is used when absent
    pub rules: Option<PathBuf>,
    /// Legacy labeled CSV the training set is generated from
    pub source_csv: Option<PathBuf>,
}

impl ModelPaths {
    /// Default locations inside the krona directory
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            artifact: dir.join("category_model.json"),
            training_data: dir.join("purchase_training.jsonl"),
            rules: None,
            source_csv: None,
        }
    }
}

/// Raw settings.json structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsFile {
    #[serde(default)]
    ingest_profiles: HashMap<String, IngestProfile>,
    #[serde(default)]
    model: ModelSettings,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ModelSettings {
    #[serde(default)]
    artifact: Option<PathBuf>,
    #[serde(default)]
    training_data: Option<PathBuf>,
    #[serde(default)]
    rules: Option<PathBuf>,
    #[serde(default)]
    source_csv: Option<PathBuf>,
}

/// Krona configuration (simplified view of settings)
#[derive(Debug, Clone)]
pub struct Config {
    pub ingest_profiles: HashMap<String, IngestProfile>,
    pub model_paths: ModelPaths,
    // Keep the raw settings for preservation when saving
    _raw_settings: SettingsFile,
}

impl Config {
    /// Load config from the krona directory
    pub fn load(krona_dir: &Path) -> Result<Self> {
        let settings_path = krona_dir.join("settings.json");

        let raw: SettingsFile = if settings_path.exists() {
            let content = std::fs::read_to_string(&settings_path)?;
            serde_json::from_str(&content).unwrap_or_default()
        } else {
            SettingsFile::default()
        };

        let defaults = ModelPaths::in_dir(krona_dir);
        let resolve = |override_path: &Option<PathBuf>, default: PathBuf| match override_path {
            Some(p) if p.is_absolute() => p.clone(),
            Some(p) => krona_dir.join(p),
            None => default,
        };
        let model_paths = ModelPaths {
            artifact: resolve(&raw.model.artifact, defaults.artifact),
            training_data: resolve(&raw.model.training_data, defaults.training_data),
            rules: raw.model.rules.as_ref().map(|p| {
                if p.is_absolute() {
                    p.clone()
                } else {
                    krona_dir.join(p)
                }
            }),
            source_csv: raw.model.source_csv.as_ref().map(|p| {
                if p.is_absolute() {
                    p.clone()
                } else {
                    krona_dir.join(p)
                }
            }),
        };

        Ok(Self {
            ingest_profiles: raw.ingest_profiles.clone(),
            model_paths,
            _raw_settings: raw,
        })
    }

    /// Save config, preserving settings the library doesn't manage
    pub fn save(&self, krona_dir: &Path) -> Result<()> {
        let settings_path = krona_dir.join("settings.json");

        let mut settings = if settings_path.exists() {
            let content = std::fs::read_to_string(&settings_path)?;
            serde_json::from_str::<SettingsFile>(&content).unwrap_or_default()
        } else {
            SettingsFile::default()
        };

        settings.ingest_profiles = self.ingest_profiles.clone();

        let content = serde_json::to_string_pretty(&settings)?;
        std::fs::write(&settings_path, content)?;
        Ok(())
    }

    /// Look up a named ingest profile
    pub fn profile(&self, name: &str) -> Option<&IngestProfile> {
        self.ingest_profiles.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_mapping_covers_core_fields() {
        let mapping = FieldMapping::standard();
        let names: Vec<_> = mapping.canonical_names().collect();
        assert_eq!(
            names,
            vec!["amount", "transactionday", "currency", "reference", "description"]
        );
    }

    #[test]
    fn test_bank_full_extends_standard() {
        let mapping = FieldMapping::bank_full();
        let names: Vec<_> = mapping.canonical_names().collect();
        assert!(names.contains(&"booked_balance"));
        assert!(names.contains(&"clearing_number"));
        // Valutadag belongs to value_day here, not transactionday
        let tday = mapping.iter().find(|r| r.canonical == "transactionday").unwrap();
        assert!(!tday.variants.iter().any(|v| v == "Valutadag"));
    }

    #[test]
    fn test_load_without_settings_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(dir.path()).unwrap();
        assert!(config.ingest_profiles.is_empty());
        assert_eq!(
            config.model_paths.artifact,
            dir.path().join("category_model.json")
        );
    }

    #[test]
    fn test_save_and_reload_profiles() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::load(dir.path()).unwrap();
        config
            .ingest_profiles
            .insert("swedbank".to_string(), IngestProfile::default());
        config.save(dir.path()).unwrap();

        let reloaded = Config::load(dir.path()).unwrap();
        let profile = reloaded.profile("swedbank").unwrap();
        assert_eq!(profile.required_columns.len(), 5);
    }

    #[test]
    fn test_unmanaged_settings_survive_save() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("settings.json"),
            r#"{"theme": "dark", "ingestProfiles": {}}"#,
        )
        .unwrap();

        let config = Config::load(dir.path()).unwrap();
        config.save(dir.path()).unwrap();

        let content = std::fs::read_to_string(dir.path().join("settings.json")).unwrap();
        assert!(content.contains("theme"));
    }

    #[test]
    fn test_relative_model_paths_resolve_against_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("settings.json"),
            r#"{"model": {"artifact": "models/cat.json"}}"#,
        )
        .unwrap();
        let config = Config::load(dir.path()).unwrap();
        assert_eq!(
            config.model_paths.artifact,
            dir.path().join("models/cat.json")
        );
    }
}
