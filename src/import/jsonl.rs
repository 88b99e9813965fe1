//! JSONL record reader

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde_json::{Map, Value};
use tracing::{debug, info};

use super::ImportError;
use crate::models::{CellValue, Table};

/// Read a newline-delimited JSON file into a table
///
/// One row per record; columns are the union of record keys in order of
/// first appearance. A record lacking a key gets a missing value for it.
/// Blank lines are skipped.
///
/// # Errors
///
/// Fails if the file cannot be read or if any non-blank line is not a JSON
/// object.
pub fn read_records(path: &Path) -> Result<Table, ImportError> {
    let content = fs::read_to_string(path).map_err(|e| ImportError::IoError {
        path: path.to_path_buf(),
        error: e.to_string(),
    })?;

    let table = parse_records(&content, path)?;

    let (rows, columns) = table.shape();
    info!(
        "Read {} records with {} columns from {}",
        rows,
        columns,
        path.display()
    );
    debug!("Schema of {}:\n{}", path.display(), table.summary());

    Ok(table)
}

/// Parse JSONL content into a table
///
/// `source` is only used for error messages.
pub fn parse_records(content: &str, source: &Path) -> Result<Table, ImportError> {
    let mut records: Vec<Map<String, Value>> = Vec::new();
    let mut columns: Vec<String> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();

    for (line_no, line) in content.lines().enumerate() {
        let trimmed = line.trim();

        // Skip empty lines
        if trimmed.is_empty() {
            continue;
        }

        let value: Value = serde_json::from_str(trimmed).map_err(|e| ImportError::JsonParse {
            path: source.to_path_buf(),
            line: line_no + 1,
            error: e.to_string(),
        })?;

        let Value::Object(record) = value else {
            return Err(ImportError::JsonParse {
                path: source.to_path_buf(),
                line: line_no + 1,
                error: "expected a JSON object".to_string(),
            });
        };

        for key in record.keys() {
            if seen.insert(key.clone()) {
                columns.push(key.clone());
            }
        }
        records.push(record);
    }

    let cells = columns
        .into_iter()
        .map(|column| {
            let values: Vec<CellValue> = records
                .iter()
                .map(|record| record.get(&column).map_or(CellValue::Null, CellValue::from_json))
                .collect();
            (column, values)
        })
        .collect();
    let table = Table::from_columns(cells)?;

    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[test]
    fn test_read_records() {
        let dir = TempDir::new().unwrap();
        let file_path = dir.path().join("cars.json");

        let mut file = fs::File::create(&file_path).unwrap();
        writeln!(file, r#"{{"MakeText": "bmw", "ID": 1}}"#).unwrap();
        writeln!(file).unwrap();
        writeln!(file, r#"{{"MakeText": "audi", "City": "Zuerich"}}"#).unwrap();

        let table = read_records(&file_path).unwrap();
        assert_eq!(table.shape(), (2, 3));
        assert_eq!(table.columns(), &["MakeText", "ID", "City"]);
        assert_eq!(table.get(0, "ID"), Some(CellValue::Int(1)));
        assert_eq!(table.get(0, "City"), Some(CellValue::Null));
        assert_eq!(table.get(1, "City"), Some(CellValue::text("Zuerich")));
    }

    #[test]
    fn test_missing_file() {
        let dir = TempDir::new().unwrap();
        let result = read_records(&dir.path().join("absent.json"));
        assert!(matches!(result, Err(ImportError::IoError { .. })));
    }

    #[test]
    fn test_invalid_line_reports_line_number() {
        let content = "{\"a\": 1}\n{not json}\n";
        let err = parse_records(content, &PathBuf::from("inline")).unwrap_err();
        match err {
            ImportError::JsonParse { line, .. } => assert_eq!(line, 2),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_non_object_line_rejected() {
        let err = parse_records("[1, 2]\n", &PathBuf::from("inline")).unwrap_err();
        assert!(matches!(err, ImportError::JsonParse { line: 1, .. }));
    }

    #[test]
    fn test_empty_content() {
        let table = parse_records("\n\n", &PathBuf::from("inline")).unwrap();
        assert_eq!(table.shape(), (0, 0));
    }
}
