//! Training service - category classifier bootstrap
//!
//! Ensures a trained model artifact exists: load it when present, otherwise
//! generate a labeled training set from the legacy bookkeeping CSV via the
//! rule table and train a fresh model. The trained model is shared
//! process-wide through a guarded lazily-initialized singleton: at most one
//! initialization/training run executes even under concurrent first use.

use std::path::Path;
use std::sync::{Arc, Mutex, OnceLock};

use regex::Regex;
use tracing::info;

use crate::adapters::BayesTextClassifier;
use crate::config::ModelPaths;
use crate::domain::result::{Error, Result};
use crate::domain::CategoryRules;
use crate::pipeline::parse_table;
use crate::ports::{Classifier, TrainingExample};

/// Process-wide model cache; unset on failed initialization so a later
/// call can retry
static SHARED_MODEL: OnceLock<Arc<BayesTextClassifier>> = OnceLock::new();
static SHARED_INIT: Mutex<()> = Mutex::new(());

fn whitespace_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").unwrap())
}

fn number_run_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b\d{3,}\b").unwrap())
}

/// Classifier bootstrap and training-set generation
#[derive(Debug, Clone)]
pub struct TrainingService {
    paths: ModelPaths,
}

impl TrainingService {
    pub fn new(paths: ModelPaths) -> Self {
        Self { paths }
    }

    pub fn paths(&self) -> &ModelPaths {
        &self.paths
    }

    /// The shared process-wide classifier, initializing it on first use
    pub fn shared_classifier(&self) -> Result<Arc<BayesTextClassifier>> {
        if let Some(model) = SHARED_MODEL.get() {
            return Ok(Arc::clone(model));
        }
        let _guard = SHARED_INIT.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(model) = SHARED_MODEL.get() {
            return Ok(Arc::clone(model));
        }
        let model = Arc::new(self.ensure_model()?);
        Ok(Arc::clone(SHARED_MODEL.get_or_init(|| model)))
    }

    /// Load the model artifact, training one first if it does not exist
    pub fn ensure_model(&self) -> Result<BayesTextClassifier> {
        if self.paths.artifact.exists() {
            return BayesTextClassifier::load(&self.paths.artifact);
        }
        self.retrain()
    }

    /// Train from the training set (generating it from the legacy CSV when
    /// absent) and persist the artifact, replacing any existing one
    pub fn retrain(&self) -> Result<BayesTextClassifier> {
        let examples = if self.paths.training_data.exists() {
            Self::load_examples(&self.paths.training_data)?
        } else if let Some(source) = &self.paths.source_csv {
            let rules = self.rules()?;
            let examples = Self::examples_from_source(source, &rules)?;
            Self::write_training_data(&examples, &self.paths.training_data)?;
            info!(
                count = examples.len(),
                path = %self.paths.training_data.display(),
                "generated training data"
            );
            examples
        } else {
            return Err(Error::classifier(
                "no model artifact, training data, or labeled source CSV",
            ));
        };

        let model = BayesTextClassifier::train(&examples)?;
        model.save(&self.paths.artifact)?;
        info!(
            examples = examples.len(),
            labels = model.labels().len(),
            path = %self.paths.artifact.display(),
            "trained category model"
        );
        Ok(model)
    }

    /// Generate the training set from the legacy CSV without training
    pub fn generate_training_data(&self) -> Result<usize> {
        let source = self
            .paths
            .source_csv
            .as_ref()
            .ok_or_else(|| Error::classifier("no labeled source CSV configured"))?;
        let rules = self.rules()?;
        let examples = Self::examples_from_source(source, &rules)?;
        Self::write_training_data(&examples, &self.paths.training_data)?;
        Ok(examples.len())
    }

    /// The active rule table: override file when configured, bundled otherwise
    pub fn rules(&self) -> Result<CategoryRules> {
        match &self.paths.rules {
            Some(path) => CategoryRules::load(path),
            None => Ok(CategoryRules::bundled()),
        }
    }

    /// Read the line-delimited training records
    pub fn load_examples(path: &Path) -> Result<Vec<TrainingExample>> {
        let content = std::fs::read_to_string(path)?;
        let mut examples = Vec::new();
        for (line_no, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let example: TrainingExample = serde_json::from_str(line).map_err(|e| {
                Error::classifier(format!("training data line {}: {}", line_no + 1, e))
            })?;
            examples.push(example);
        }
        if examples.is_empty() {
            return Err(Error::classifier(format!(
                "no training rows found in {}",
                path.display()
            )));
        }
        Ok(examples)
    }

    /// Label legacy bookkeeping rows (`Ställe;Kategori;Specifikation`) with
    /// the rule table
    fn examples_from_source(source: &Path, rules: &CategoryRules) -> Result<Vec<TrainingExample>> {
        let raw = std::fs::read(source)?;
        let table = parse_table(&raw)?;

        let lower: Vec<String> = table
            .headers
            .iter()
            .map(|h| h.trim().to_lowercase())
            .collect();
        let find = |names: &[&str]| {
            names
                .iter()
                .find_map(|n| lower.iter().position(|h| h.as_str() == *n))
        };
        let merchant_idx = find(&["ställe", "stalle"]);
        let legacy_idx = find(&["kategori"]);
        let details_idx = find(&["specifikation", "spec"]);

        let missing: Vec<String> = [
            (merchant_idx, "Ställe"),
            (legacy_idx, "Kategori"),
            (details_idx, "Specifikation"),
        ]
        .iter()
        .filter(|(idx, _)| idx.is_none())
        .map(|(_, name)| name.to_string())
        .collect();
        if !missing.is_empty() {
            return Err(Error::MissingColumns { columns: missing });
        }
        let (merchant_idx, legacy_idx, details_idx) = (
            merchant_idx.unwrap_or_default(),
            legacy_idx.unwrap_or_default(),
            details_idx.unwrap_or_default(),
        );

        let mut examples = Vec::new();
        for row in &table.rows {
            let merchant = normalize_text(&row[merchant_idx]);
            let legacy = normalize_text(&row[legacy_idx]);
            let details = normalize_text(&row[details_idx]);

            if merchant.is_empty() && legacy.is_empty() && details.is_empty() {
                continue;
            }

            let label = rules.map_label(&merchant, &legacy, &details).to_string();
            let text = format!("{} | {}", scrub_text(&merchant), scrub_text(&details))
                .trim()
                .to_string();
            if text.is_empty() || text == "|" {
                continue;
            }

            examples.push(TrainingExample { text, label });
        }
        Ok(examples)
    }

    /// Write the JSONL artifact atomically
    fn write_training_data(examples: &[TrainingExample], path: &Path) -> Result<()> {
        use std::io::Write;

        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        for example in examples {
            let line = serde_json::to_string(example)?;
            writeln!(tmp, "{}", line)?;
        }
        tmp.persist(path).map_err(|e| Error::Io(e.error))?;
        Ok(())
    }
}

/// Collapse whitespace (non-breaking spaces included) and trim
fn normalize_text(s: &str) -> String {
    let s = s.replace('\u{a0}', " ");
    whitespace_re().replace_all(&s, " ").trim().to_string()
}

/// Replace digit runs of three or more with a placeholder so the model does
/// not memorize card and phone numbers
fn scrub_text(s: &str) -> String {
    number_run_re().replace_all(s, "<NUM>").into_owned()
}
