//! Train command - category classifier bootstrap

use std::path::PathBuf;

use anyhow::Result;
use serde_json::json;

use krona_core::services::TrainingService;
use krona_core::Classifier;

use super::get_context;
use crate::output;

pub fn run(
    source: Option<PathBuf>,
    rules: Option<PathBuf>,
    force: bool,
    json: bool,
) -> Result<()> {
    let ctx = get_context(None)?;

    let mut paths = ctx.config.model_paths.clone();
    if let Some(source) = source {
        paths.source_csv = Some(source);
    }
    if let Some(rules) = rules {
        paths.rules = Some(rules);
    }
    let service = TrainingService::new(paths);

    let model = if force {
        service.retrain()?
    } else {
        service.ensure_model()?
    };

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&json!({
                "labels": model.labels().len(),
                "artifact": service.paths().artifact,
            }))?
        );
        return Ok(());
    }

    output::success(&format!(
        "Category model ready ({} labels)",
        model.labels().len()
    ));
    println!("  Artifact: {}", service.paths().artifact.display());
    println!("  Training data: {}", service.paths().training_data.display());

    Ok(())
}
