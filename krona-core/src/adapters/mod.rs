//! Adapter implementations
//!
//! Concrete implementations of the port traits. Today that is a single
//! naive-Bayes text classifier behind the Classifier port; swapping the
//! model means swapping this adapter.

pub mod bayes;

pub use bayes::BayesTextClassifier;
