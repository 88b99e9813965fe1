//! Config command implementation

use crate::cli::error::CliError;
use crate::config::sample_config;
use std::path::Path;

/// Handle the config command
///
/// Prints the sample configuration, or writes it to `output`.
pub fn handle_config(output: Option<&Path>, force: bool) -> Result<(), CliError> {
    let Some(path) = output else {
        print!("{}", sample_config());
        return Ok(());
    };

    if path.exists() && !force {
        return Err(CliError::OutputExists(path.to_path_buf()));
    }

    std::fs::write(path, sample_config())
        .map_err(|e| CliError::FileWriteError(path.to_path_buf(), e.to_string()))?;
    println!("Wrote sample configuration to {}", path.display());
    Ok(())
}
