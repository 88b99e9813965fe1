//! Validate-config command implementation

use crate::cli::error::CliError;
use crate::config::{ConfigError, PipelineConfig};
use crate::validation::validate_config;
use std::path::Path;

/// Handle the validate-config command
///
/// The file is checked as written; environment overrides are not applied.
pub fn handle_validate_config(path: &Path) -> Result<PipelineConfig, CliError> {
    if !path.exists() {
        return Err(CliError::FileNotFound(path.to_path_buf()));
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::IoError(format!("Failed to read config: {}", e)))?;

    let config = PipelineConfig::parse(&content)?;
    validate_config(&config)?;

    println!("Configuration is valid: {}", path.display());
    Ok(config)
}
