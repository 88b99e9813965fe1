//! XLSX exporter
//!
//! Writes tables to an Office Open XML workbook. The zip container is built
//! with `zip` and every XML part with `quick-xml`. Each sheet starts with a
//! header row whose first cell is empty, followed by one row per table row
//! with the row position in column A.

use std::borrow::Cow;
use std::io::{Cursor, Write};
use std::path::Path;

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use tracing::{debug, info};
use zip::CompressionMethod;
use zip::write::FileOptions;

use super::ExportError;
use crate::config::SheetNames;
use crate::models::{CellValue, Table};
use crate::transform::PipelineOutput;
use crate::validation::config::{ConfigValidationError, validate_sheet_name};

const NS_MAIN: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
const NS_DOC_RELS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const NS_PKG_RELS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
const NS_CONTENT_TYPES: &str = "http://schemas.openxmlformats.org/package/2006/content-types";

const REL_OFFICE_DOCUMENT: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";
const REL_WORKSHEET: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet";
const REL_STYLES: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles";
const REL_CORE_PROPS: &str =
    "http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties";
const REL_APP_PROPS: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/extended-properties";

const CT_RELS: &str = "application/vnd.openxmlformats-package.relationships+xml";
const CT_WORKBOOK: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml";
const CT_WORKSHEET: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml";
const CT_STYLES: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml";
const CT_CORE_PROPS: &str = "application/vnd.openxmlformats-package.core-properties+xml";
const CT_APP_PROPS: &str =
    "application/vnd.openxmlformats-officedocument.extended-properties+xml";

const APPLICATION: &str = "car-listing-pipeline";

/// Style index of bold cells (header row and index column)
const BOLD_STYLE: &str = "1";

/// Workbook builder
///
/// # Example
///
/// ```rust
/// use car_listing_pipeline::export::XlsxExporter;
/// use car_listing_pipeline::models::{CellValue, Table};
///
/// let table =
///     Table::from_rows(vec!["make".to_string()], vec![vec![CellValue::text("BMW")]]).unwrap();
///
/// let mut exporter = XlsxExporter::new();
/// exporter.add_sheet("integration", &table).unwrap();
/// let bytes = exporter.to_bytes().unwrap();
/// assert_eq!(&bytes[..2], b"PK");
/// ```
#[derive(Debug, Default)]
pub struct XlsxExporter<'a> {
    sheets: Vec<(String, &'a Table)>,
}

impl<'a> XlsxExporter<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a sheet; names must be valid and unique ignoring case
    pub fn add_sheet(&mut self, name: &str, table: &'a Table) -> Result<(), ExportError> {
        validate_sheet_name(name).map_err(|e| match e {
            ConfigValidationError::InvalidSheetName { name, reason } => {
                ExportError::InvalidSheetName { name, reason }
            }
            other => ExportError::ExportError(other.to_string()),
        })?;

        let lowered = name.to_lowercase();
        if self.sheets.iter().any(|(n, _)| n.to_lowercase() == lowered) {
            return Err(ExportError::InvalidSheetName {
                name: name.to_string(),
                reason: "a sheet with this name already exists".to_string(),
            });
        }

        self.sheets.push((name.to_string(), table));
        Ok(())
    }

    /// Sheet names in workbook order
    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// Build the workbook in memory
    pub fn to_bytes(&self) -> Result<Vec<u8>, ExportError> {
        if self.sheets.is_empty() {
            return Err(ExportError::ExportError(
                "Workbook must contain at least one sheet".to_string(),
            ));
        }

        let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

        let mut add_part = |name: &str, content: Vec<u8>| -> Result<(), ExportError> {
            zip.start_file(name, options)
                .map_err(|e| ExportError::IoError(format!("Failed to add {}: {}", name, e)))?;
            zip.write_all(&content)
                .map_err(|e| ExportError::IoError(format!("Failed to write {}: {}", name, e)))
        };

        add_part("[Content_Types].xml", self.content_types_xml()?)?;
        add_part("_rels/.rels", root_rels_xml()?)?;
        add_part("docProps/core.xml", core_props_xml()?)?;
        add_part("docProps/app.xml", app_props_xml()?)?;
        add_part("xl/workbook.xml", self.workbook_xml()?)?;
        add_part("xl/_rels/workbook.xml.rels", self.workbook_rels_xml()?)?;
        add_part("xl/styles.xml", styles_xml()?)?;
        for (i, (name, table)) in self.sheets.iter().enumerate() {
            debug!(
                "Writing sheet '{}' ({} rows x {} columns)",
                name,
                table.num_rows(),
                table.num_columns()
            );
            add_part(&format!("xl/worksheets/sheet{}.xml", i + 1), worksheet_xml(table)?)?;
        }

        let cursor = zip
            .finish()
            .map_err(|e| ExportError::IoError(format!("Failed to finish workbook: {}", e)))?;
        Ok(cursor.into_inner())
    }

    /// Write the workbook, replacing any existing file
    pub fn write_to(&self, path: &Path) -> Result<(), ExportError> {
        let bytes = self.to_bytes()?;

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| {
                ExportError::IoError(format!("Failed to create {}: {}", parent.display(), e))
            })?;
        }

        std::fs::write(path, bytes)
            .map_err(|e| ExportError::IoError(format!("Failed to write {}: {}", path.display(), e)))?;

        info!(
            "Exported {} sheet(s) to {}",
            self.sheets.len(),
            path.display()
        );
        Ok(())
    }

    fn content_types_xml(&self) -> Result<Vec<u8>, ExportError> {
        let mut xml = XmlPart::new()?;
        xml.start("Types", &[("xmlns", NS_CONTENT_TYPES)])?;
        xml.empty("Default", &[("Extension", "rels"), ("ContentType", CT_RELS)])?;
        xml.empty(
            "Default",
            &[("Extension", "xml"), ("ContentType", "application/xml")],
        )?;
        xml.empty(
            "Override",
            &[("PartName", "/xl/workbook.xml"), ("ContentType", CT_WORKBOOK)],
        )?;
        for i in 1..=self.sheets.len() {
            let part = format!("/xl/worksheets/sheet{}.xml", i);
            xml.empty(
                "Override",
                &[("PartName", part.as_str()), ("ContentType", CT_WORKSHEET)],
            )?;
        }
        xml.empty(
            "Override",
            &[("PartName", "/xl/styles.xml"), ("ContentType", CT_STYLES)],
        )?;
        xml.empty(
            "Override",
            &[("PartName", "/docProps/core.xml"), ("ContentType", CT_CORE_PROPS)],
        )?;
        xml.empty(
            "Override",
            &[("PartName", "/docProps/app.xml"), ("ContentType", CT_APP_PROPS)],
        )?;
        xml.end("Types")?;
        Ok(xml.finish())
    }

    fn workbook_xml(&self) -> Result<Vec<u8>, ExportError> {
        let mut xml = XmlPart::new()?;
        xml.start("workbook", &[("xmlns", NS_MAIN), ("xmlns:r", NS_DOC_RELS)])?;
        xml.start("sheets", &[])?;
        for (i, (name, _)) in self.sheets.iter().enumerate() {
            let id = (i + 1).to_string();
            let rel = format!("rId{}", i + 1);
            xml.empty(
                "sheet",
                &[
                    ("name", name.as_str()),
                    ("sheetId", id.as_str()),
                    ("r:id", rel.as_str()),
                ],
            )?;
        }
        xml.end("sheets")?;
        xml.end("workbook")?;
        Ok(xml.finish())
    }

    fn workbook_rels_xml(&self) -> Result<Vec<u8>, ExportError> {
        let mut xml = XmlPart::new()?;
        xml.start("Relationships", &[("xmlns", NS_PKG_RELS)])?;
        for i in 1..=self.sheets.len() {
            let id = format!("rId{}", i);
            let target = format!("worksheets/sheet{}.xml", i);
            xml.empty(
                "Relationship",
                &[
                    ("Id", id.as_str()),
                    ("Type", REL_WORKSHEET),
                    ("Target", target.as_str()),
                ],
            )?;
        }
        let styles_id = format!("rId{}", self.sheets.len() + 1);
        xml.empty(
            "Relationship",
            &[
                ("Id", styles_id.as_str()),
                ("Type", REL_STYLES),
                ("Target", "styles.xml"),
            ],
        )?;
        xml.end("Relationships")?;
        Ok(xml.finish())
    }
}

/// Write the three pipeline tables to one workbook
pub fn write_pipeline_workbook(
    path: &Path,
    output: &PipelineOutput,
    sheets: &SheetNames,
) -> Result<(), ExportError> {
    let mut exporter = XlsxExporter::new();
    exporter.add_sheet(&sheets.pre_process, &output.reshaped)?;
    exporter.add_sheet(&sheets.normalization, &output.normalized)?;
    exporter.add_sheet(&sheets.integration, &output.integrated)?;
    exporter.write_to(path)
}

/// Spreadsheet column letters for a zero-based column position
pub(crate) fn column_letter(mut pos: usize) -> String {
    let mut letters = Vec::new();
    loop {
        letters.push(b'A' + (pos % 26) as u8);
        if pos < 26 {
            break;
        }
        pos = pos / 26 - 1;
    }
    letters.reverse();
    String::from_utf8_lossy(&letters).into_owned()
}

fn worksheet_xml(table: &Table) -> Result<Vec<u8>, ExportError> {
    let names = table.columns();
    let columns = names
        .iter()
        .map(|name| table.column_values(name))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| ExportError::ExportError(e.to_string()))?;

    let mut xml = XmlPart::new()?;
    xml.start("worksheet", &[("xmlns", NS_MAIN)])?;
    xml.start("sheetData", &[])?;

    xml.start("row", &[("r", "1")])?;
    for (pos, name) in names.iter().enumerate() {
        let reference = format!("{}1", column_letter(pos + 1));
        write_text_cell(&mut xml, &reference, name, Some(BOLD_STYLE))?;
    }
    xml.end("row")?;

    for row in 0..table.num_rows() {
        let row_number = (row + 2).to_string();
        xml.start("row", &[("r", row_number.as_str())])?;

        let reference = format!("A{}", row_number);
        write_number_cell(&mut xml, &reference, &row.to_string(), Some(BOLD_STYLE))?;

        for (pos, values) in columns.iter().enumerate() {
            let reference = format!("{}{}", column_letter(pos + 1), row_number);
            write_value_cell(&mut xml, &reference, &values[row])?;
        }
        xml.end("row")?;
    }

    xml.end("sheetData")?;
    xml.end("worksheet")?;
    Ok(xml.finish())
}

fn write_value_cell(xml: &mut XmlPart, reference: &str, value: &CellValue) -> Result<(), ExportError> {
    match value {
        CellValue::Null => Ok(()),
        CellValue::Text(s) => write_text_cell(xml, reference, s, None),
        CellValue::Int(i) => write_number_cell(xml, reference, &i.to_string(), None),
        CellValue::Float(f) if f.is_finite() => {
            write_number_cell(xml, reference, &f.to_string(), None)
        }
        CellValue::Float(_) => Ok(()),
        CellValue::Bool(b) => {
            xml.start("c", &[("r", reference), ("t", "b")])?;
            xml.element_text("v", &[], if *b { "1" } else { "0" })?;
            xml.end("c")
        }
    }
}

fn write_text_cell(
    xml: &mut XmlPart,
    reference: &str,
    text: &str,
    style: Option<&str>,
) -> Result<(), ExportError> {
    let mut attrs = vec![("r", reference), ("t", "inlineStr")];
    if let Some(style) = style {
        attrs.push(("s", style));
    }
    let text = escape_control_chars(text);
    xml.start("c", &attrs)?;
    xml.start("is", &[])?;
    if text.starts_with(char::is_whitespace) || text.ends_with(char::is_whitespace) {
        xml.element_text("t", &[("xml:space", "preserve")], &text)?;
    } else {
        xml.element_text("t", &[], &text)?;
    }
    xml.end("is")?;
    xml.end("c")
}

/// Encode characters XML 1.0 cannot carry as `_xHHHH_`
///
/// Tab, line feed and carriage return are kept. An underscore that would
/// otherwise start an `_xHHHH_` sequence is itself encoded as `_x005F_`.
fn escape_control_chars(text: &str) -> Cow<'_, str> {
    let needs_escape = text
        .char_indices()
        .any(|(i, c)| is_disallowed_control(c) || (c == '_' && starts_escape_sequence(&text[i..])));
    if !needs_escape {
        return Cow::Borrowed(text);
    }

    let mut out = String::with_capacity(text.len() + 8);
    for (i, c) in text.char_indices() {
        if is_disallowed_control(c) || (c == '_' && starts_escape_sequence(&text[i..])) {
            out.push_str(&format!("_x{:04X}_", c as u32));
        } else {
            out.push(c);
        }
    }
    Cow::Owned(out)
}

fn is_disallowed_control(c: char) -> bool {
    matches!(c, '\u{0}'..='\u{8}' | '\u{B}' | '\u{C}' | '\u{E}'..='\u{1F}')
}

fn starts_escape_sequence(text: &str) -> bool {
    let bytes = text.as_bytes();
    bytes.len() >= 7
        && bytes[0] == b'_'
        && bytes[1] == b'x'
        && bytes[2..6].iter().all(u8::is_ascii_hexdigit)
        && bytes[6] == b'_'
}

fn write_number_cell(
    xml: &mut XmlPart,
    reference: &str,
    number: &str,
    style: Option<&str>,
) -> Result<(), ExportError> {
    let mut attrs = vec![("r", reference)];
    if let Some(style) = style {
        attrs.push(("s", style));
    }
    xml.start("c", &attrs)?;
    xml.element_text("v", &[], number)?;
    xml.end("c")
}

fn root_rels_xml() -> Result<Vec<u8>, ExportError> {
    let mut xml = XmlPart::new()?;
    xml.start("Relationships", &[("xmlns", NS_PKG_RELS)])?;
    for (id, kind, target) in [
        ("rId1", REL_OFFICE_DOCUMENT, "xl/workbook.xml"),
        ("rId2", REL_CORE_PROPS, "docProps/core.xml"),
        ("rId3", REL_APP_PROPS, "docProps/app.xml"),
    ] {
        xml.empty(
            "Relationship",
            &[("Id", id), ("Type", kind), ("Target", target)],
        )?;
    }
    xml.end("Relationships")?;
    Ok(xml.finish())
}

fn core_props_xml() -> Result<Vec<u8>, ExportError> {
    let now = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string();

    let mut xml = XmlPart::new()?;
    xml.start(
        "cp:coreProperties",
        &[
            (
                "xmlns:cp",
                "http://schemas.openxmlformats.org/package/2006/metadata/core-properties",
            ),
            ("xmlns:dc", "http://purl.org/dc/elements/1.1/"),
            ("xmlns:dcterms", "http://purl.org/dc/terms/"),
            ("xmlns:xsi", "http://www.w3.org/2001/XMLSchema-instance"),
        ],
    )?;
    xml.element_text("dc:creator", &[], APPLICATION)?;
    xml.element_text("dcterms:created", &[("xsi:type", "dcterms:W3CDTF")], &now)?;
    xml.element_text("dcterms:modified", &[("xsi:type", "dcterms:W3CDTF")], &now)?;
    xml.end("cp:coreProperties")?;
    Ok(xml.finish())
}

fn app_props_xml() -> Result<Vec<u8>, ExportError> {
    let mut xml = XmlPart::new()?;
    xml.start(
        "Properties",
        &[(
            "xmlns",
            "http://schemas.openxmlformats.org/officeDocument/2006/extended-properties",
        )],
    )?;
    xml.element_text("Application", &[], APPLICATION)?;
    xml.end("Properties")?;
    Ok(xml.finish())
}

fn styles_xml() -> Result<Vec<u8>, ExportError> {
    let mut xml = XmlPart::new()?;
    xml.start("styleSheet", &[("xmlns", NS_MAIN)])?;

    xml.start("fonts", &[("count", "2")])?;
    for bold in [false, true] {
        xml.start("font", &[])?;
        if bold {
            xml.empty("b", &[])?;
        }
        xml.empty("sz", &[("val", "11")])?;
        xml.empty("name", &[("val", "Calibri")])?;
        xml.end("font")?;
    }
    xml.end("fonts")?;

    xml.start("fills", &[("count", "2")])?;
    for pattern in ["none", "gray125"] {
        xml.start("fill", &[])?;
        xml.empty("patternFill", &[("patternType", pattern)])?;
        xml.end("fill")?;
    }
    xml.end("fills")?;

    xml.start("borders", &[("count", "1")])?;
    xml.start("border", &[])?;
    for side in ["left", "right", "top", "bottom", "diagonal"] {
        xml.empty(side, &[])?;
    }
    xml.end("border")?;
    xml.end("borders")?;

    xml.start("cellStyleXfs", &[("count", "1")])?;
    xml.empty(
        "xf",
        &[("numFmtId", "0"), ("fontId", "0"), ("fillId", "0"), ("borderId", "0")],
    )?;
    xml.end("cellStyleXfs")?;

    xml.start("cellXfs", &[("count", "2")])?;
    xml.empty(
        "xf",
        &[
            ("numFmtId", "0"),
            ("fontId", "0"),
            ("fillId", "0"),
            ("borderId", "0"),
            ("xfId", "0"),
        ],
    )?;
    xml.empty(
        "xf",
        &[
            ("numFmtId", "0"),
            ("fontId", "1"),
            ("fillId", "0"),
            ("borderId", "0"),
            ("xfId", "0"),
            ("applyFont", "1"),
        ],
    )?;
    xml.end("cellXfs")?;

    xml.start("cellStyles", &[("count", "1")])?;
    xml.empty(
        "cellStyle",
        &[("name", "Normal"), ("xfId", "0"), ("builtinId", "0")],
    )?;
    xml.end("cellStyles")?;

    xml.end("styleSheet")?;
    Ok(xml.finish())
}

/// Thin wrapper over a `quick-xml` writer for one workbook part
struct XmlPart {
    writer: Writer<Vec<u8>>,
}

impl XmlPart {
    fn new() -> Result<Self, ExportError> {
        let mut part = Self {
            writer: Writer::new(Vec::new()),
        };
        part.write(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;
        Ok(part)
    }

    fn write(&mut self, event: Event<'_>) -> Result<(), ExportError> {
        self.writer
            .write_event(event)
            .map_err(|e| ExportError::SerializationError(format!("Failed to write XML: {}", e)))
    }

    fn start(&mut self, name: &str, attrs: &[(&str, &str)]) -> Result<(), ExportError> {
        let element = BytesStart::new(name).with_attributes(attrs.iter().copied());
        self.write(Event::Start(element))
    }

    fn empty(&mut self, name: &str, attrs: &[(&str, &str)]) -> Result<(), ExportError> {
        let element = BytesStart::new(name).with_attributes(attrs.iter().copied());
        self.write(Event::Empty(element))
    }

    fn end(&mut self, name: &str) -> Result<(), ExportError> {
        self.write(Event::End(BytesEnd::new(name)))
    }

    fn element_text(
        &mut self,
        name: &str,
        attrs: &[(&str, &str)],
        text: &str,
    ) -> Result<(), ExportError> {
        self.start(name, attrs)?;
        self.write(Event::Text(BytesText::new(text)))?;
        self.end(name)
    }

    fn finish(self) -> Vec<u8> {
        self.writer.into_inner()
    }
}
