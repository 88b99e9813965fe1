//! Import functionality
//!
//! Loads supplier listing records into a [`Table`](crate::models::Table):
//! - JSONL (newline-delimited JSON, one record per line)

pub mod jsonl;

use std::path::PathBuf;

use crate::models::TableError;

pub use jsonl::{parse_records, read_records};

/// Error during import
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("IO error reading {path}: {error}")]
    IoError { path: PathBuf, error: String },

    #[error("Invalid JSON in {path} at line {line}: {error}")]
    JsonParse {
        path: PathBuf,
        line: usize,
        error: String,
    },

    #[error("Table error: {0}")]
    Table(#[from] TableError),
}
