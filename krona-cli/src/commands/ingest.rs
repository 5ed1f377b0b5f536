//! Ingest command - run the full pipeline on a statement file

use std::path::Path;

use anyhow::Result;

use super::get_context;
use crate::output;

pub fn run(file: &Path, profile: Option<&str>, preview: bool, limit: usize, json: bool) -> Result<()> {
    let ctx = get_context(profile)?;
    let result = ctx.ingest_service.ingest_path(file)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    output::success(&format!(
        "Ingested {} transaction(s) from {}",
        result.transactions.len(),
        file.display()
    ));
    println!();
    println!("  Encoding: {}", result.encoding);
    println!("  Delimiter: {:?}", result.delimiter);
    println!("  Rows parsed: {}", result.rows_parsed);
    if result.rows_dropped > 0 {
        println!("  Rows dropped (blank/duplicate): {}", result.rows_dropped);
    }

    if preview {
        println!();
        let mut table = output::create_table();
        table.set_header(vec!["Date", "Amount", "Expense", "Category", "Conf.", "Reference"]);
        for tx in result.transactions.iter().take(limit) {
            table.add_row(vec![
                tx.transaction_day.to_string(),
                format!("{:.2}", tx.amount),
                if tx.is_expense { "yes" } else { "no" }.to_string(),
                tx.category.clone(),
                tx.category_confidence
                    .map(|c| format!("{:.2}", c))
                    .unwrap_or_else(|| "-".to_string()),
                tx.reference.clone().unwrap_or_else(|| "-".to_string()),
            ]);
        }
        println!("{}", table);

        if result.transactions.len() > limit {
            println!("... and {} more", result.transactions.len() - limit);
        }
    }

    Ok(())
}
