//! Detect command - report resolved format without ingesting

use std::path::Path;

use anyhow::Result;

use super::get_context;
use crate::output;

pub fn run(file: &Path, profile: Option<&str>, json: bool) -> Result<()> {
    let ctx = get_context(profile)?;
    let raw = std::fs::read(file)?;
    let detected = ctx.ingest_service.detect(&raw)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&detected)?);
        return Ok(());
    }

    output::info(&format!("Detected format for {}", file.display()));
    println!();
    println!("  Encoding: {}", detected.encoding);
    println!("  Delimiter: {:?}", detected.delimiter);
    println!();

    let mut table = output::create_table();
    table.set_header(vec!["Header", "Canonical"]);
    for (raw_header, normalized) in detected
        .raw_headers
        .iter()
        .zip(&detected.normalized_headers)
    {
        let canonical = if raw_header == normalized {
            "-".to_string()
        } else {
            normalized.clone()
        };
        table.add_row(vec![raw_header.clone(), canonical]);
    }
    println!("{}", table);

    Ok(())
}
