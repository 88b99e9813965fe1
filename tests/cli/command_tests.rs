//! Tests for the inspect, config and validate-config commands

use crate::common::{two_record_jsonl, write_fixture};
use car_listing_pipeline::cli::commands::config::handle_config;
use car_listing_pipeline::cli::commands::inspect::handle_inspect;
use car_listing_pipeline::cli::commands::validate::handle_validate_config;
use car_listing_pipeline::cli::error::CliError;
use car_listing_pipeline::config::{PipelineConfig, ReshapeStrategy};
use std::path::Path;
use tempfile::tempdir;

#[test]
fn test_inspect_summary() {
    let dir = tempdir().unwrap();
    let input = write_fixture(dir.path(), "supplier_car.json", &two_record_jsonl());

    let summary = handle_inspect(&input, false).unwrap();
    assert_eq!(summary.rows, 2);
    assert_eq!(summary.columns[0].name, "ID");
    assert_eq!(summary.columns[0].dtype, "i64");

    assert!(handle_inspect(&input, true).is_ok());
}

#[test]
fn test_inspect_missing_file() {
    assert!(matches!(
        handle_inspect(Path::new("/nonexistent/cars.jsonl"), false),
        Err(CliError::FileNotFound(_))
    ));
}

#[test]
fn test_config_writes_sample() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("car-pipeline.toml");

    handle_config(Some(&path), false).unwrap();
    let loaded = PipelineConfig::parse(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(loaded, PipelineConfig::default());

    assert!(matches!(
        handle_config(Some(&path), false),
        Err(CliError::OutputExists(_))
    ));
    assert!(handle_config(Some(&path), true).is_ok());
}

#[test]
fn test_validate_config() {
    let dir = tempdir().unwrap();
    let good = write_fixture(
        dir.path(),
        "good.toml",
        "[reshape]\nstrategy = \"unstack\"\n",
    );
    let config = handle_validate_config(&good).unwrap();
    assert_eq!(config.reshape.strategy, ReshapeStrategy::Unstack);

    let bad = write_fixture(
        dir.path(),
        "bad.toml",
        "[reshape]\nsplit_targets = [\"mileage\"]\n",
    );
    assert!(matches!(
        handle_validate_config(&bad),
        Err(CliError::InvalidConfig(_))
    ));

    let unparsable = write_fixture(dir.path(), "broken.toml", "[reshape\n");
    assert!(matches!(
        handle_validate_config(&unparsable),
        Err(CliError::ConfigError(_))
    ));
}
