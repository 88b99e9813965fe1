//! Inspect command implementation

use crate::cli::error::CliError;
use crate::import::read_records;
use crate::models::TableSummary;
use std::path::Path;

/// Handle the inspect command
///
/// Reads a JSONL file and prints its schema summary, as text or JSON.
pub fn handle_inspect(input: &Path, json: bool) -> Result<TableSummary, CliError> {
    if !input.exists() {
        return Err(CliError::FileNotFound(input.to_path_buf()));
    }

    let table = read_records(input)?;
    let summary = table.summary();

    if json {
        let rendered = serde_json::to_string_pretty(&summary)
            .map_err(|e| CliError::SerializationError(e.to_string()))?;
        println!("{}", rendered);
    } else {
        println!("Input: {}", input.display());
        print!("{}", summary);
    }

    Ok(summary)
}
