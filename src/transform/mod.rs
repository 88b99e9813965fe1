//! Transformation stages
//!
//! The pipeline runs four stages strictly in sequence:
//! 1. read (see [`crate::import`])
//! 2. [`reshape`]: long attribute rows to wide columns, plus the mileage split
//! 3. [`normalize`]: value substitutions and case rules
//! 4. [`integrate`]: drop, rename, reorder and numeric coercion
//!
//! Every stage borrows its input and returns a new [`Table`], so the output
//! of one stage is never altered by a later one.

pub mod integrate;
pub mod normalize;
pub mod reshape;

use std::path::Path;

use polars::prelude::PolarsError;
use tracing::{info, warn};

use crate::config::{IntegrateConfig, PipelineConfig};
use crate::export::{ExportError, write_pipeline_workbook};
use crate::import::{ImportError, read_records};
use crate::models::{Table, TableError};
use crate::validation::config::{ConfigValidationError, validate_config};

pub use integrate::integrate;
pub use normalize::{fold_case, normalize, title_case};
pub use reshape::{reshape, split_column};

/// Error raised by a transformation stage
#[derive(Debug, thiserror::Error)]
pub enum TransformError {
    #[error("{stage}: column '{column}' not found")]
    MissingColumn { stage: &'static str, column: String },

    #[error("{stage}: {reason}")]
    InvalidArgument { stage: &'static str, reason: String },

    #[error("Table error: {0}")]
    Table(#[from] TableError),

    #[error("Frame error: {0}")]
    Frame(#[from] PolarsError),
}

/// Error raised while running the whole pipeline
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(#[from] ConfigValidationError),

    #[error("Import error: {0}")]
    Import(#[from] ImportError),

    #[error("Transform error: {0}")]
    Transform(#[from] TransformError),

    #[error("Export error: {0}")]
    Export(#[from] ExportError),
}

/// Check that a configured column exists
///
/// Returns `Ok(false)` for an absent column in lenient mode so the caller
/// can skip it.
pub(crate) fn require_column(
    table: &Table,
    stage: &'static str,
    column: &str,
    strict: bool,
) -> Result<bool, TransformError> {
    if table.has_column(column) {
        return Ok(true);
    }
    if strict {
        return Err(TransformError::MissingColumn {
            stage,
            column: column.to_string(),
        });
    }
    warn!("{}: skipping missing column '{}'", stage, column);
    Ok(false)
}

/// Tables produced by one pipeline run
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOutput {
    /// Wide table after reshaping and the mileage split
    pub reshaped: Table,
    /// Table after substitutions and case rules
    pub normalized: Table,
    /// Final table in the business schema
    pub integrated: Table,
}

/// Configured pipeline
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    /// Create a pipeline after validating its configuration
    pub fn new(config: PipelineConfig) -> Result<Self, PipelineError> {
        validate_config(&config)?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run reshape, normalize and integrate on an already loaded table
    pub fn run(&self, raw: &Table) -> Result<PipelineOutput, TransformError> {
        let strict = self.config.pipeline.strict;

        let reshaped = reshape(raw, &self.config.reshape, strict)?;
        let (rows, columns) = reshaped.shape();
        info!(
            "Reshaped ({}) into {} rows x {} columns",
            self.config.reshape.strategy, rows, columns
        );

        let normalized = normalize(&reshaped, &self.config.normalize, strict)?;
        info!(
            "Normalized {} rows x {} columns",
            normalized.num_rows(),
            normalized.num_columns()
        );

        let integrate_config = IntegrateConfig {
            drop_columns: self.config.effective_drop_columns(),
            ..self.config.integrate.clone()
        };
        let integrated = integrate(&normalized, &integrate_config, strict)?;
        info!(
            "Integrated {} rows x {} columns",
            integrated.num_rows(),
            integrated.num_columns()
        );

        Ok(PipelineOutput {
            reshaped,
            normalized,
            integrated,
        })
    }

    /// Read a JSONL file and run every stage on it
    pub fn run_file(&self, input: &Path) -> Result<PipelineOutput, PipelineError> {
        let raw = read_records(input)?;
        Ok(self.run(&raw)?)
    }

    /// Read the configured input, run every stage and write the configured workbook
    pub fn execute(&self) -> Result<PipelineOutput, PipelineError> {
        let output = self.run_file(&self.config.input.path)?;
        write_pipeline_workbook(&self.config.output.path, &output, &self.config.output.sheets)?;
        info!("Wrote workbook {}", self.config.output.path.display());
        Ok(output)
    }
}
