//! Port definitions (hexagonal architecture)
//!
//! The pipeline depends only on these traits; concrete implementations
//! live in `adapters`.

mod classifier;

pub use classifier::{Classifier, TrainingExample};
