//! Krona Core - bank statement ingestion and categorization
//!
//! This crate implements the ingestion pipeline following hexagonal
//! architecture:
//!
//! - **domain**: Core entities (tables, transactions, errors, rule data)
//! - **pipeline**: Ordered parsing/normalization/validation stages
//! - **ports**: Trait definitions for external dependencies (Classifier)
//! - **services**: Business logic orchestration (ingest, training)
//! - **adapters**: Concrete implementations (naive-Bayes classifier)
//!
//! Persistence and presentation are caller concerns: the pipeline consumes
//! an uploaded file and a field-mapping configuration and produces a
//! validated row set.

pub mod adapters;
pub mod config;
pub mod domain;
pub mod pipeline;
pub mod ports;
pub mod services;

use std::path::Path;

use anyhow::Result;

use config::{Config, IngestProfile};
use services::{IngestService, TrainingService};

// Re-export commonly used types at crate root
pub use domain::result::Error;
pub use domain::{CategoryRules, Cell, RawTable, Table, Transaction};
pub use ports::Classifier;

/// Main context for Krona operations
///
/// The primary entry point for callers. It holds the configuration and the
/// services wired to it.
pub struct KronaContext {
    pub config: Config,
    pub ingest_service: IngestService,
    pub training_service: TrainingService,
}

impl KronaContext {
    /// Create a new Krona context
    ///
    /// `profile` selects a named ingest profile from settings; without one
    /// the built-in standard profile is used.
    pub fn new(krona_dir: &Path, profile: Option<&str>) -> Result<Self> {
        let config = Config::load(krona_dir)?;

        let profile = match profile {
            Some(name) => config
                .profile(name)
                .cloned()
                .ok_or_else(|| anyhow::anyhow!("Ingest profile not found: {}", name))?,
            None => IngestProfile::default(),
        };

        let training_service = TrainingService::new(config.model_paths.clone());
        let ingest_service = IngestService::new(profile, training_service.clone());

        Ok(Self {
            config,
            ingest_service,
            training_service,
        })
    }
}
