//! Integration tests for the XLSX exporter

mod common;

use car_listing_pipeline::config::SheetNames;
use car_listing_pipeline::export::{ExportError, XlsxExporter, write_pipeline_workbook};
use car_listing_pipeline::models::{CellValue, Table};
use car_listing_pipeline::transform::PipelineOutput;
use common::read_part;
use tempfile::tempdir;

fn listing_table() -> Table {
    Table::from_rows(
        vec![
            "make".to_string(),
            "mileage".to_string(),
            "mileage_unit".to_string(),
        ],
        vec![
            vec![
                CellValue::text("BMW"),
                CellValue::Float(7.4),
                CellValue::text("kilometer"),
            ],
            vec![
                CellValue::text("Mercedes-Benz"),
                CellValue::Null,
                CellValue::text("null"),
            ],
        ],
    )
    .unwrap()
}

#[test]
fn test_workbook_parts() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("book.xlsx");

    let table = listing_table();
    let mut exporter = XlsxExporter::new();
    exporter.add_sheet("integration", &table).unwrap();
    exporter.write_to(&path).unwrap();

    let file = std::fs::File::open(&path).unwrap();
    let archive = zip::ZipArchive::new(file).unwrap();
    let mut names: Vec<&str> = archive.file_names().collect();
    names.sort();
    assert_eq!(
        names,
        vec![
            "[Content_Types].xml",
            "_rels/.rels",
            "docProps/app.xml",
            "docProps/core.xml",
            "xl/_rels/workbook.xml.rels",
            "xl/styles.xml",
            "xl/workbook.xml",
            "xl/worksheets/sheet1.xml",
        ]
    );

    let content_types = read_part(&path, "[Content_Types].xml");
    assert!(content_types.contains("/xl/worksheets/sheet1.xml"));

    let core = read_part(&path, "docProps/core.xml");
    assert!(core.contains("<dcterms:created"));
}

#[test]
fn test_sheet_content() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("book.xlsx");

    let table = listing_table();
    let mut exporter = XlsxExporter::new();
    exporter.add_sheet("integration", &table).unwrap();
    exporter.write_to(&path).unwrap();

    let sheet = read_part(&path, "xl/worksheets/sheet1.xml");
    assert!(sheet.contains("<t>make</t>"));
    assert!(sheet.contains("<t>mileage_unit</t>"));
    assert!(sheet.contains(r#"<c r="C2"><v>7.4</v></c>"#));
    assert!(sheet.contains("<t>Mercedes-Benz</t>"));
    // Missing mileage in the second row has no cell
    assert!(!sheet.contains(r#"r="C3""#));
    assert!(sheet.contains(r#"<c r="A3" s="1"><v>1</v></c>"#));
}

#[test]
fn test_pipeline_workbook_custom_sheet_names() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nested").join("dir").join("task_output.xlsx");

    let table = listing_table();
    let output = PipelineOutput {
        reshaped: table.clone(),
        normalized: table.clone(),
        integrated: table,
    };
    let sheets = SheetNames {
        integration: "integration_pt".to_string(),
        ..SheetNames::default()
    };

    write_pipeline_workbook(&path, &output, &sheets).unwrap();

    let workbook = read_part(&path, "xl/workbook.xml");
    assert!(workbook.contains(r#"name="pre-process""#));
    assert!(workbook.contains(r#"name="normalization""#));
    assert!(workbook.contains(r#"name="integration_pt""#));
    assert!(workbook.contains(r#"sheetId="3""#));

    let rels = read_part(&path, "xl/_rels/workbook.xml.rels");
    assert!(rels.contains("worksheets/sheet3.xml"));
    assert!(rels.contains("styles.xml"));
}

#[test]
fn test_invalid_sheet_name_leaves_no_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("task_output.xlsx");

    let table = listing_table();
    let output = PipelineOutput {
        reshaped: table.clone(),
        normalized: table.clone(),
        integrated: table,
    };
    let sheets = SheetNames {
        normalization: "norm?".to_string(),
        ..SheetNames::default()
    };

    let err = write_pipeline_workbook(&path, &output, &sheets).unwrap_err();
    assert!(matches!(err, ExportError::InvalidSheetName { .. }));
    assert!(!path.exists());
}

#[test]
fn test_empty_table_sheet() {
    let table = Table::from_rows(vec!["make".to_string()], vec![]).unwrap();
    let mut exporter = XlsxExporter::new();
    exporter.add_sheet("empty", &table).unwrap();
    let bytes = exporter.to_bytes().unwrap();
    assert!(!bytes.is_empty());
}
