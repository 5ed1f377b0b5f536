//! Classifier port - text categorization abstraction

use serde::{Deserialize, Serialize};

use crate::domain::result::Result;

/// One labeled training record
///
/// This is the line format of the training data artifact: each line is an
/// independent JSON object with exactly the two string fields below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TrainingExample {
    pub text: String,
    pub label: String,
}

/// A trained text classifier consumed as a black box
///
/// The pipeline only depends on this trait; the concrete model lives in an
/// adapter and is loaded once per process.
pub trait Classifier: Send + Sync {
    /// The closed label set, in model order
    fn labels(&self) -> &[String];

    /// Most likely label for a transaction text
    fn predict(&self, text: &str) -> Result<String>;

    /// Per-label probabilities aligned with [`labels`](Self::labels), when
    /// the model supports probability output
    fn predict_proba(&self, text: &str) -> Option<Vec<f64>>;
}
