//! Tests for the run command

use crate::common::{full_listing_jsonl, read_part, two_record_jsonl, write_fixture};
use car_listing_pipeline::cli::commands::run::{RunArgs, handle_run};
use car_listing_pipeline::cli::error::CliError;
use car_listing_pipeline::config::ReshapeStrategy;
use tempfile::tempdir;

#[test]
fn test_run_full_listing() {
    let dir = tempdir().unwrap();
    let input = write_fixture(dir.path(), "supplier_car.json", &full_listing_jsonl());
    let output = dir.path().join("task_output.xlsx");

    let args = RunArgs {
        input: Some(input),
        output: Some(output.clone()),
        ..RunArgs::default()
    };
    let result = handle_run(&args).unwrap();

    assert_eq!(result.integrated.num_rows(), 2);
    assert!(output.exists());
    assert!(read_part(&output, "xl/workbook.xml").contains("integration"));
}

#[test]
fn test_run_refuses_overwrite_without_force() {
    let dir = tempdir().unwrap();
    let input = write_fixture(dir.path(), "supplier_car.json", &two_record_jsonl());
    let output = write_fixture(dir.path(), "task_output.xlsx", "existing");

    let mut args = RunArgs {
        input: Some(input),
        output: Some(output.clone()),
        no_strict: true,
        ..RunArgs::default()
    };
    assert!(matches!(handle_run(&args), Err(CliError::OutputExists(_))));
    assert_eq!(std::fs::read_to_string(&output).unwrap(), "existing");

    args.force = true;
    handle_run(&args).unwrap();
    assert_ne!(std::fs::read(&output).unwrap(), b"existing");
}

#[test]
fn test_run_strict_fails_on_sparse_input() {
    let dir = tempdir().unwrap();
    let input = write_fixture(dir.path(), "supplier_car.json", &two_record_jsonl());

    let args = RunArgs {
        input: Some(input),
        output: Some(dir.path().join("out.xlsx")),
        strategy: Some(ReshapeStrategy::Unstack),
        ..RunArgs::default()
    };
    assert!(matches!(handle_run(&args), Err(CliError::TransformError(_))));
    assert!(!dir.path().join("out.xlsx").exists());
}

#[test]
fn test_run_missing_input() {
    let dir = tempdir().unwrap();
    let args = RunArgs {
        input: Some(dir.path().join("missing.json")),
        output: Some(dir.path().join("out.xlsx")),
        ..RunArgs::default()
    };
    assert!(matches!(handle_run(&args), Err(CliError::FileNotFound(_))));
}
