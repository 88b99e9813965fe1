//! Pipeline configuration validation.
//!
//! Catches configuration mistakes before any data is read: empty key lists,
//! a malformed split, duplicate column targets and sheet names the
//! spreadsheet format rejects.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::PipelineConfig;

/// Maximum length of a worksheet name
pub const MAX_SHEET_NAME_LENGTH: usize = 31;

/// Characters not allowed in worksheet names
pub const INVALID_SHEET_NAME_CHARS: [char; 7] = ['[', ']', ':', '*', '?', '/', '\\'];

/// Errors found in a pipeline configuration.
#[derive(Debug, Clone, Error, PartialEq, Serialize, Deserialize)]
pub enum ConfigValidationError {
    /// A required value is empty
    #[error("{0} cannot be empty")]
    Empty(&'static str),

    /// A list has the wrong number of entries
    #[error("{field} must have exactly {expected} entries, got {actual}")]
    WrongCount {
        field: &'static str,
        expected: usize,
        actual: usize,
    },

    /// A list names the same column twice
    #[error("{field} lists '{name}' more than once")]
    Duplicate { field: &'static str, name: String },

    /// A worksheet name the workbook format would reject
    #[error("Invalid sheet name '{name}': {reason}")]
    InvalidSheetName { name: String, reason: String },
}

/// Result type for configuration validation.
pub type ConfigValidationResult<T> = Result<T, ConfigValidationError>;

/// Validate a worksheet name.
///
/// # Rules
///
/// - Must not be empty
/// - At most 31 characters
/// - Must not contain any of `[ ] : * ? / \`
///
/// # Examples
///
/// ```
/// use car_listing_pipeline::validation::config::validate_sheet_name;
///
/// assert!(validate_sheet_name("pre-process").is_ok());
/// assert!(validate_sheet_name("a/b").is_err());
/// ```
pub fn validate_sheet_name(name: &str) -> ConfigValidationResult<()> {
    let invalid = |reason: String| ConfigValidationError::InvalidSheetName {
        name: name.to_string(),
        reason,
    };

    if name.is_empty() {
        return Err(invalid("name is empty".to_string()));
    }

    let len = name.chars().count();
    if len > MAX_SHEET_NAME_LENGTH {
        return Err(invalid(format!(
            "longer than {} characters ({})",
            MAX_SHEET_NAME_LENGTH, len
        )));
    }

    if let Some(c) = name.chars().find(|c| INVALID_SHEET_NAME_CHARS.contains(c)) {
        return Err(invalid(format!("contains '{}'", c)));
    }

    Ok(())
}

fn require_unique<'a, I>(field: &'static str, names: I, case_insensitive: bool) -> ConfigValidationResult<()>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut seen = HashSet::new();
    for name in names {
        let key = if case_insensitive {
            name.to_lowercase()
        } else {
            name.to_string()
        };
        if !seen.insert(key) {
            return Err(ConfigValidationError::Duplicate {
                field,
                name: name.to_string(),
            });
        }
    }
    Ok(())
}

/// Validate a whole pipeline configuration.
pub fn validate_config(config: &PipelineConfig) -> ConfigValidationResult<()> {
    let reshape = &config.reshape;
    if reshape.key_columns.is_empty() {
        return Err(ConfigValidationError::Empty("reshape.key_columns"));
    }
    require_unique(
        "reshape.key_columns",
        reshape.key_columns.iter().map(String::as_str),
        false,
    )?;
    if reshape.attribute_name_column.is_empty() {
        return Err(ConfigValidationError::Empty("reshape.attribute_name_column"));
    }
    if reshape.attribute_value_column.is_empty() {
        return Err(ConfigValidationError::Empty("reshape.attribute_value_column"));
    }
    if reshape.split_delimiter.is_empty() {
        return Err(ConfigValidationError::Empty("reshape.split_delimiter"));
    }
    if reshape.split_targets.len() != 2 {
        return Err(ConfigValidationError::WrongCount {
            field: "reshape.split_targets",
            expected: 2,
            actual: reshape.split_targets.len(),
        });
    }
    require_unique(
        "reshape.split_targets",
        reshape.split_targets.iter().map(String::as_str),
        false,
    )?;

    if config.normalize.case_fold_column.is_empty() {
        return Err(ConfigValidationError::Empty("normalize.case_fold_column"));
    }

    let integrate = &config.integrate;
    require_unique(
        "integrate.canonical_order",
        integrate.canonical_order.iter().map(String::as_str),
        false,
    )?;
    require_unique(
        "integrate.rename",
        integrate.rename.values().map(String::as_str),
        false,
    )?;

    let sheets = config.output.sheets.in_order();
    for name in sheets {
        validate_sheet_name(name)?;
    }
    require_unique("output.sheets", sheets, true)?;

    Ok(())
}
