//! Multinomial naive-Bayes text classifier
//!
//! The trained model is a plain serde structure persisted as JSON; loaders
//! treat the artifact as immutable. Tokenization is deliberately simple:
//! lowercased runs of alphanumeric characters, which keeps Swedish merchant
//! strings like "ICA NÄRA" intact as tokens.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::domain::result::{Error, Result};
use crate::ports::{Classifier, TrainingExample};

/// Laplace smoothing constant
const ALPHA: f64 = 1.0;

/// A trained classifier: priors and token likelihoods in log space
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BayesTextClassifier {
    labels: Vec<String>,
    vocab: HashMap<String, usize>,
    /// ln P(class), indexed by label
    class_log_prior: Vec<f64>,
    /// ln P(token | class), indexed `[label][token]`
    token_log_likelihood: Vec<Vec<f64>>,
}

impl BayesTextClassifier {
    /// Train from labeled examples
    pub fn train(examples: &[TrainingExample]) -> Result<Self> {
        if examples.is_empty() {
            return Err(Error::classifier("no training examples"));
        }

        let mut labels: Vec<String> = Vec::new();
        let mut label_index: HashMap<&str, usize> = HashMap::new();
        for example in examples {
            if !label_index.contains_key(example.label.as_str()) {
                label_index.insert(example.label.as_str(), labels.len());
                labels.push(example.label.clone());
            }
        }

        let mut vocab: HashMap<String, usize> = HashMap::new();
        let tokenized: Vec<(usize, Vec<String>)> = examples
            .iter()
            .map(|e| {
                let tokens = tokenize(&e.text);
                for token in &tokens {
                    if !vocab.contains_key(token) {
                        vocab.insert(token.clone(), vocab.len());
                    }
                }
                (label_index[e.label.as_str()], tokens)
            })
            .collect();

        let vocab_size = vocab.len();
        let mut doc_counts = vec![0usize; labels.len()];
        let mut token_counts = vec![vec![0usize; vocab_size]; labels.len()];
        let mut class_totals = vec![0usize; labels.len()];

        for (class, tokens) in &tokenized {
            doc_counts[*class] += 1;
            for token in tokens {
                let idx = vocab[token];
                token_counts[*class][idx] += 1;
                class_totals[*class] += 1;
            }
        }

        let n_docs = examples.len() as f64;
        let class_log_prior = doc_counts
            .iter()
            .map(|c| (*c as f64 / n_docs).ln())
            .collect();

        let token_log_likelihood = token_counts
            .iter()
            .zip(&class_totals)
            .map(|(counts, total)| {
                let denom = *total as f64 + ALPHA * vocab_size as f64;
                counts
                    .iter()
                    .map(|c| ((*c as f64 + ALPHA) / denom).ln())
                    .collect()
            })
            .collect();

        Ok(Self {
            labels,
            vocab,
            class_log_prior,
            token_log_likelihood,
        })
    }

    /// Load a persisted model
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::classifier(format!("cannot read model {}: {}", path.display(), e)))?;
        let model: Self = serde_json::from_str(&content)
            .map_err(|e| Error::classifier(format!("cannot parse model {}: {}", path.display(), e)))?;
        if model.labels.is_empty() {
            return Err(Error::classifier("model artifact has no labels"));
        }
        Ok(model)
    }

    /// Persist the model atomically (temp file, then rename into place)
    pub fn save(&self, path: &Path) -> Result<()> {
        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        serde_json::to_writer(&mut tmp, self)?;
        tmp.persist(path).map_err(|e| Error::Io(e.error))?;
        Ok(())
    }

    /// Unnormalized log posterior per label
    fn log_scores(&self, text: &str) -> Vec<f64> {
        let tokens = tokenize(text);
        self.class_log_prior
            .iter()
            .enumerate()
            .map(|(class, prior)| {
                let mut score = *prior;
                for token in &tokens {
                    if let Some(idx) = self.vocab.get(token) {
                        score += self.token_log_likelihood[class][*idx];
                    }
                }
                score
            })
            .collect()
    }
}

impl Classifier for BayesTextClassifier {
    fn labels(&self) -> &[String] {
        &self.labels
    }

    fn predict(&self, text: &str) -> Result<String> {
        let scores = self.log_scores(text);
        let best = scores
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(idx, _)| idx)
            .ok_or_else(|| Error::classifier("model has no labels"))?;
        Ok(self.labels[best].clone())
    }

    fn predict_proba(&self, text: &str) -> Option<Vec<f64>> {
        let scores = self.log_scores(text);
        if scores.is_empty() {
            return None;
        }
        // log-sum-exp normalization
        let max = scores.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let exp: Vec<f64> = scores.iter().map(|s| (s - max).exp()).collect();
        let total: f64 = exp.iter().sum();
        Some(exp.iter().map(|e| e / total).collect())
    }
}

/// Lowercased alphanumeric token runs
fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn example(text: &str, label: &str) -> TrainingExample {
        TrainingExample {
            text: text.to_string(),
            label: label.to_string(),
        }
    }

    fn trained() -> BayesTextClassifier {
        BayesTextClassifier::train(&[
            example("ica nara mat frukt", "Dagligvaror"),
            example("ica supermarket mjolk brod", "Dagligvaror"),
            example("coop konsum mat", "Dagligvaror"),
            example("sl biljett pendeltag", "Lokaltrafik"),
            example("sl manadskort tunnelbana", "Lokaltrafik"),
            example("systembolaget vin ol", "Alkohol"),
        ])
        .unwrap()
    }

    #[test]
    fn test_predicts_dominant_class() {
        let model = trained();
        assert_eq!(model.predict("ica mat").unwrap(), "Dagligvaror");
        assert_eq!(model.predict("sl biljett").unwrap(), "Lokaltrafik");
        assert_eq!(model.predict("systembolaget vin").unwrap(), "Alkohol");
    }

    #[test]
    fn test_proba_sums_to_one_and_agrees_with_predict() {
        let model = trained();
        let probs = model.predict_proba("ica mat").unwrap();
        let total: f64 = probs.iter().sum();
        assert!((total - 1.0).abs() < 1e-9);

        let best = probs
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
            .unwrap()
            .0;
        assert_eq!(model.labels()[best], model.predict("ica mat").unwrap());
    }

    #[test]
    fn test_unknown_tokens_fall_back_to_priors() {
        let model = trained();
        // Nothing in vocabulary: the majority class wins on prior alone
        assert_eq!(model.predict("zzz qqq").unwrap(), "Dagligvaror");
    }

    #[test]
    fn test_empty_training_set_is_an_error() {
        let err = BayesTextClassifier::train(&[]).unwrap_err();
        assert!(matches!(err, Error::ClassifierUnavailable(_)));
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        let model = trained();
        model.save(&path).unwrap();

        let loaded = BayesTextClassifier::load(&path).unwrap();
        assert_eq!(loaded.labels(), model.labels());
        assert_eq!(loaded.predict("ica mat").unwrap(), "Dagligvaror");
    }

    #[test]
    fn test_load_missing_artifact_is_classifier_unavailable() {
        let err = BayesTextClassifier::load(Path::new("/nonexistent/model.json")).unwrap_err();
        assert!(matches!(err, Error::ClassifierUnavailable(_)));
    }

    #[test]
    fn test_tokenizer_keeps_swedish_letters() {
        assert_eq!(tokenize("ICA NÄRA, Söder-köp 123"), vec!["ica", "nära", "söder", "köp", "123"]);
    }
}
