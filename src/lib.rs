//! Car Listing Pipeline - supplier car listings to a business schema
//!
//! Provides:
//! - JSONL import of long-format supplier records
//! - Reshaping (pivot or unstack) into one column per attribute
//! - Normalization of values and string case
//! - Integration into the target schema (drop, rename, reorder, numeric coercion)
//! - XLSX export of the three intermediate tables
//! - TOML configuration with environment overrides

#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod export;
pub mod import;
pub mod models;
pub mod transform;
pub mod validation;

// Re-export commonly used types
pub use config::{ConfigError, PipelineConfig, ReshapeStrategy, SheetNames};
pub use export::{ExportError, XlsxExporter, write_pipeline_workbook};
pub use import::{ImportError, parse_records, read_records};
pub use models::{CellValue, Table, TableError, TableSummary};
pub use transform::{Pipeline, PipelineError, PipelineOutput, TransformError};
pub use validation::{ConfigValidationError, validate_config};
