//! CLI-specific error types

use crate::config::ConfigError;
use crate::export::ExportError;
use crate::import::ImportError;
use crate::transform::{PipelineError, TransformError};
use crate::validation::ConfigValidationError;
use std::path::PathBuf;
use thiserror::Error;

/// CLI-specific error type
#[derive(Error, Debug)]
pub enum CliError {
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to write file {0}: {1}")]
    FileWriteError(PathBuf, String),

    #[error("{0} already exists. Use --force to overwrite.")]
    OutputExists(PathBuf),

    #[error("Configuration error: {0}")]
    ConfigError(#[from] ConfigError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(#[from] ConfigValidationError),

    #[error("Import error: {0}")]
    ImportError(#[from] ImportError),

    #[error("Transform error: {0}")]
    TransformError(#[from] TransformError),

    #[error("Pipeline error: {0}")]
    PipelineError(#[from] PipelineError),

    #[error("Export error: {0}")]
    ExportError(#[from] ExportError),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}
