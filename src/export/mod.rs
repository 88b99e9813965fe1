//! Export functionality
//!
//! Provides the spreadsheet writer for pipeline results:
//! - XLSX (Office Open XML workbook, one sheet per table)

pub mod xlsx;

/// Error during export
#[derive(Debug, thiserror::Error, serde::Serialize, serde::Deserialize)]
pub enum ExportError {
    #[error("Serialization error: {0}")]
    SerializationError(String),
    #[error("Invalid sheet name '{name}': {reason}")]
    InvalidSheetName { name: String, reason: String },
    #[error("IO error: {0}")]
    IoError(String),
    #[error("Export error: {0}")]
    ExportError(String),
}

// Re-export for convenience
pub use xlsx::{XlsxExporter, write_pipeline_workbook};
