//! Run command implementation

use crate::cli::error::CliError;
use crate::config::{CONFIG_FILENAME, PipelineConfig, ReshapeStrategy};
use crate::export::write_pipeline_workbook;
use crate::import::read_records;
use crate::models::Table;
use crate::transform::{Pipeline, PipelineOutput};
use std::path::{Path, PathBuf};

/// Arguments for the run command
#[derive(Debug, Clone, Default)]
pub struct RunArgs {
    /// Configuration file (defaults to `car-pipeline.toml` when present)
    pub config: Option<PathBuf>,
    /// Input JSONL file, overriding the configuration
    pub input: Option<PathBuf>,
    /// Output workbook, overriding the configuration
    pub output: Option<PathBuf>,
    /// Reshape strategy, overriding the configuration
    pub strategy: Option<ReshapeStrategy>,
    /// Skip missing columns instead of failing
    pub no_strict: bool,
    /// Overwrite an existing workbook
    pub force: bool,
}

/// Resolve the effective configuration: file, then environment, then flags
pub fn resolve_config(args: &RunArgs) -> Result<PipelineConfig, CliError> {
    let mut config = match &args.config {
        Some(path) => {
            if !path.exists() {
                return Err(CliError::FileNotFound(path.clone()));
            }
            PipelineConfig::load(path)?
        }
        None => PipelineConfig::load(Path::new(CONFIG_FILENAME))?,
    };

    if let Some(input) = &args.input {
        config.input.path = input.clone();
    }
    if let Some(output) = &args.output {
        config.output.path = output.clone();
    }
    if let Some(strategy) = args.strategy {
        config.reshape.strategy = strategy;
    }
    if args.no_strict {
        config.pipeline.strict = false;
    }

    Ok(config)
}

/// Handle the run command
pub fn handle_run(args: &RunArgs) -> Result<PipelineOutput, CliError> {
    let config = resolve_config(args)?;

    if !config.input.path.exists() {
        return Err(CliError::FileNotFound(config.input.path.clone()));
    }
    if config.output.path.exists() && !args.force {
        return Err(CliError::OutputExists(config.output.path.clone()));
    }

    let pipeline = Pipeline::new(config)?;
    let config = pipeline.config();

    let raw = read_records(&config.input.path)?;
    println!("Input: {}", config.input.path.display());
    print!("{}", raw.summary());

    let output = pipeline.run(&raw)?;
    write_pipeline_workbook(&config.output.path, &output, &config.output.sheets)?;

    println!();
    println!(
        "Wrote {} ({} strategy)",
        config.output.path.display(),
        config.reshape.strategy
    );
    let sheets = config.output.sheets.in_order();
    let tables = [&output.reshaped, &output.normalized, &output.integrated];
    for (name, table) in sheets.iter().zip(tables) {
        println!("  {}", sheet_report(name, table));
    }

    Ok(output)
}

fn sheet_report(name: &str, table: &Table) -> String {
    let (rows, columns) = table.shape();
    format!("{:<16} {:>6} rows  {:>4} columns", name, rows, columns)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CellValue;

    #[test]
    fn test_flags_override_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("pipeline.toml");
        std::fs::write(&config_path, "[reshape]\nstrategy = \"pivot\"\n").unwrap();

        let args = RunArgs {
            config: Some(config_path),
            input: Some(PathBuf::from("cars.jsonl")),
            strategy: Some(ReshapeStrategy::Unstack),
            no_strict: true,
            ..RunArgs::default()
        };
        let config = resolve_config(&args).unwrap();

        assert_eq!(config.input.path, PathBuf::from("cars.jsonl"));
        assert_eq!(config.reshape.strategy, ReshapeStrategy::Unstack);
        assert!(!config.pipeline.strict);
    }

    #[test]
    fn test_missing_config_file() {
        let args = RunArgs {
            config: Some(PathBuf::from("/nonexistent/pipeline.toml")),
            ..RunArgs::default()
        };
        assert!(matches!(
            resolve_config(&args),
            Err(CliError::FileNotFound(_))
        ));
    }

    #[test]
    fn test_sheet_report() {
        let table =
            Table::from_rows(vec!["make".to_string()], vec![vec![CellValue::text("BMW")]]).unwrap();
        let report = sheet_report("integration", &table);
        assert!(report.starts_with("integration"));
        assert!(report.contains("1 rows"));
        assert!(report.contains("1 columns"));
    }
}
