//! CLI command implementations

pub mod detect;
pub mod ingest;
pub mod train;

use std::path::PathBuf;

use anyhow::{Context, Result};
use krona_core::KronaContext;

/// Get the krona directory from environment or default
pub fn get_krona_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("KRONA_DIR") {
        PathBuf::from(dir)
    } else {
        dirs::home_dir()
            .expect("Could not find home directory")
            .join(".krona")
    }
}

/// Get or create the krona context
pub fn get_context(profile: Option<&str>) -> Result<KronaContext> {
    let krona_dir = get_krona_dir();

    std::fs::create_dir_all(&krona_dir)
        .with_context(|| format!("Failed to create krona directory: {:?}", krona_dir))?;

    KronaContext::new(&krona_dir, profile).context("Failed to initialize krona context")
}
