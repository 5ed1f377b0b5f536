//! Service layer - business logic orchestration
//!
//! Services coordinate the pipeline stages and port interactions. Each
//! service focuses on one use case.

pub mod ingest;
pub mod training;

pub use ingest::{DetectedFormat, IngestResult, IngestService};
pub use training::TrainingService;
