//! Shared fixtures for integration tests

#![allow(dead_code)]

use serde_json::json;
use std::path::{Path, PathBuf};

/// Every attribute the default configuration touches
pub const FULL_ATTRIBUTES: [(&str, &str); 19] = [
    ("Ccm", "2993"),
    ("Co2EmissionText", "195 g/km"),
    ("ConsumptionRatingText", "F"),
    ("Doors", "5"),
    ("DriveTypeText", "Allrad"),
    ("FuelTypeText", "Diesel"),
    ("Hp", "245"),
    ("InteriorColorText", "schwarz"),
    ("Km", "128000"),
    ("Properties", "\"Ab MFK\""),
    ("Seats", "5"),
    ("TransmissionTypeText", "Automat"),
    ("ConsumptionTotalText", "7.4 l/100km"),
    ("BodyColorText", "schwarz mét."),
    ("BodyTypeText", "SUV / Geländewagen"),
    ("ConditionTypeText", "Occasion"),
    ("City", "Zuzwil"),
    ("FirstRegYear", "2012"),
    ("FirstRegMonth", "7"),
];

/// One supplier line for a single attribute of a vehicle
pub fn record_line(id: u64, make: &str, type_name: &str, model: &str, name: &str, value: &str) -> String {
    json!({
        "ID": id,
        "MakeText": make,
        "TypeName": type_name,
        "TypeNameFull": format!("{} {} {}", make, model, type_name),
        "ModelText": model,
        "ModelTypeText": type_name,
        "Attribute Names": name,
        "Attribute Values": value,
        "entity_id": format!("{}-{}", id, name),
    })
    .to_string()
}

/// All lines for one vehicle, with attribute values optionally replaced
pub fn vehicle_lines(
    id: u64,
    make: &str,
    type_name: &str,
    model: &str,
    overrides: &[(&str, &str)],
) -> Vec<String> {
    FULL_ATTRIBUTES
        .iter()
        .map(|(name, value)| {
            let value = overrides
                .iter()
                .find(|(n, _)| n == name)
                .map_or(*value, |(_, v)| *v);
            record_line(id, make, type_name, model, name, value)
        })
        .collect()
}

/// Two vehicles carrying every attribute of the default configuration
pub fn full_listing_jsonl() -> String {
    let mut lines = vehicle_lines(1, "bmw", "X5 xDrive30d", "x5", &[]);
    lines.extend(vehicle_lines(
        2,
        "mercedes-benz",
        "C 200",
        "c-klasse",
        &[
            ("FirstRegYear", "N/A"),
            ("ConsumptionTotalText", "6.1"),
            ("BodyColorText", "0"),
        ],
    ));
    lines.join("\n") + "\n"
}

/// Two records with different attribute names
pub fn two_record_jsonl() -> String {
    [
        record_line(1, "bmw", "X5 xDrive30d", "x5", "FirstRegYear", "2012"),
        record_line(2, "audi", "A4 Avant", "a4", "BodyColorText", "rot"),
    ]
    .join("\n")
}

/// Write fixture content into a directory and return the file path
pub fn write_fixture(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).expect("write fixture");
    path
}

/// Read one part of a workbook as text
pub fn read_part(workbook: &Path, part: &str) -> String {
    use std::io::Read;

    let file = std::fs::File::open(workbook).expect("open workbook");
    let mut archive = zip::ZipArchive::new(file).expect("read workbook zip");
    let mut entry = archive.by_name(part).expect("workbook part");
    let mut content = String::new();
    entry.read_to_string(&mut content).expect("read part");
    content
}
