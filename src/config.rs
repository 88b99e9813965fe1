//! Pipeline configuration file support
//!
//! Handles parsing of `car-pipeline.toml` configuration files and
//! environment variable overrides. Every field has a default matching the
//! supplier feed, so an empty file is a valid configuration.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::models::columns;

/// Default configuration filename
pub const CONFIG_FILENAME: &str = "car-pipeline.toml";

/// Default input file
pub const DEFAULT_INPUT_PATH: &str = "supplier_car.json";

/// Default output workbook
pub const DEFAULT_OUTPUT_PATH: &str = "task_output.xlsx";

/// Default placeholder written for missing values in substituted columns
pub const DEFAULT_MISSING_PLACEHOLDER: &str = "null";

/// Environment variable for the input file
pub const ENV_INPUT: &str = "CAR_PIPELINE_INPUT";

/// Environment variable for the output workbook
pub const ENV_OUTPUT: &str = "CAR_PIPELINE_OUTPUT";

/// Environment variable for the reshape strategy
pub const ENV_STRATEGY: &str = "CAR_PIPELINE_STRATEGY";

/// Environment variable for strict column handling
pub const ENV_STRICT: &str = "CAR_PIPELINE_STRICT";

/// Error type for configuration handling
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Failed to parse config: {0}")]
    ParseError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

/// Result type for configuration handling
pub type ConfigResult<T> = Result<T, ConfigError>;

/// How long-format attribute rows are turned into columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReshapeStrategy {
    /// One row per distinct key, first non-null value per attribute (default)
    #[default]
    Pivot,
    /// One row per input record, keyed by record position and key columns
    Unstack,
}

impl std::str::FromStr for ReshapeStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pivot" | "pivot-table" => Ok(ReshapeStrategy::Pivot),
            "unstack" => Ok(ReshapeStrategy::Unstack),
            _ => Err(format!(
                "Unknown reshape strategy: {}. Use 'pivot' or 'unstack'.",
                s
            )),
        }
    }
}

impl std::fmt::Display for ReshapeStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReshapeStrategy::Pivot => write!(f, "pivot"),
            ReshapeStrategy::Unstack => write!(f, "unstack"),
        }
    }
}

/// Input section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputSection {
    /// Path to the JSONL listing file
    #[serde(default = "default_input_path")]
    pub path: PathBuf,
}

fn default_input_path() -> PathBuf {
    PathBuf::from(DEFAULT_INPUT_PATH)
}

impl Default for InputSection {
    fn default() -> Self {
        Self {
            path: default_input_path(),
        }
    }
}

/// Names of the three workbook sheets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SheetNames {
    #[serde(default = "default_pre_process_sheet")]
    pub pre_process: String,
    #[serde(default = "default_normalization_sheet")]
    pub normalization: String,
    #[serde(default = "default_integration_sheet")]
    pub integration: String,
}

fn default_pre_process_sheet() -> String {
    "pre-process".to_string()
}

fn default_normalization_sheet() -> String {
    "normalization".to_string()
}

fn default_integration_sheet() -> String {
    "integration".to_string()
}

impl Default for SheetNames {
    fn default() -> Self {
        Self {
            pre_process: default_pre_process_sheet(),
            normalization: default_normalization_sheet(),
            integration: default_integration_sheet(),
        }
    }
}

impl SheetNames {
    /// Sheet names in workbook order
    pub fn in_order(&self) -> [&str; 3] {
        [
            self.pre_process.as_str(),
            self.normalization.as_str(),
            self.integration.as_str(),
        ]
    }
}

/// Output section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputSection {
    /// Path of the workbook to write (overwritten on every run)
    #[serde(default = "default_output_path")]
    pub path: PathBuf,

    /// Sheet names
    #[serde(default)]
    pub sheets: SheetNames,
}

fn default_output_path() -> PathBuf {
    PathBuf::from(DEFAULT_OUTPUT_PATH)
}

impl Default for OutputSection {
    fn default() -> Self {
        Self {
            path: default_output_path(),
            sheets: SheetNames::default(),
        }
    }
}

/// General pipeline behaviour
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineSection {
    /// Fail when a configured column is absent instead of skipping it
    #[serde(default = "default_strict")]
    pub strict: bool,
}

fn default_strict() -> bool {
    true
}

impl Default for PipelineSection {
    fn default() -> Self {
        Self {
            strict: default_strict(),
        }
    }
}

/// Reshape stage configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReshapeConfig {
    #[serde(default)]
    pub strategy: ReshapeStrategy,

    /// Columns forming the composite key
    #[serde(default = "default_key_columns")]
    pub key_columns: Vec<String>,

    /// Column holding attribute names (become column headers)
    #[serde(default = "default_attribute_name_column")]
    pub attribute_name_column: String,

    /// Column holding attribute values (become cells)
    #[serde(default = "default_attribute_value_column")]
    pub attribute_value_column: String,

    /// Text column split into the two target columns
    #[serde(default = "default_split_source_column")]
    pub split_source_column: String,

    /// Delimiter substring for the split
    #[serde(default = "default_split_delimiter")]
    pub split_delimiter: String,

    /// Target columns for the segments before and after the delimiter
    #[serde(default = "default_split_targets")]
    pub split_targets: Vec<String>,
}

fn default_key_columns() -> Vec<String> {
    columns::owned(&columns::KEY_COLUMNS)
}

fn default_attribute_name_column() -> String {
    columns::ATTRIBUTE_NAMES.to_string()
}

fn default_attribute_value_column() -> String {
    columns::ATTRIBUTE_VALUES.to_string()
}

fn default_split_source_column() -> String {
    columns::CONSUMPTION_TOTAL_TEXT.to_string()
}

fn default_split_delimiter() -> String {
    columns::CONSUMPTION_DELIMITER.to_string()
}

fn default_split_targets() -> Vec<String> {
    columns::owned(&[columns::MILEAGE, columns::MILEAGE_UNIT])
}

impl Default for ReshapeConfig {
    fn default() -> Self {
        Self {
            strategy: ReshapeStrategy::default(),
            key_columns: default_key_columns(),
            attribute_name_column: default_attribute_name_column(),
            attribute_value_column: default_attribute_value_column(),
            split_source_column: default_split_source_column(),
            split_delimiter: default_split_delimiter(),
            split_targets: default_split_targets(),
        }
    }
}

/// Normalize stage configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizeConfig {
    /// Columns the substitution map applies to
    #[serde(default = "default_substitution_columns")]
    pub columns: Vec<String>,

    /// Exact-match value substitutions
    #[serde(default = "default_substitutions")]
    pub substitutions: BTreeMap<String, String>,

    /// Replace missing values in substituted columns with the placeholder
    #[serde(default = "default_fill_missing")]
    pub fill_missing: bool,

    /// Placeholder text for missing values
    #[serde(default = "default_missing_placeholder")]
    pub missing_placeholder: String,

    /// Column whose values are upper-cased (short) or title-cased (long)
    #[serde(default = "default_case_fold_column")]
    pub case_fold_column: String,

    /// Values up to this many characters are upper-cased
    #[serde(default = "default_upper_case_max_len")]
    pub upper_case_max_len: usize,

    /// Columns title-cased with missing values kept missing
    #[serde(default = "default_title_case_columns")]
    pub title_case_columns: Vec<String>,
}

fn default_substitution_columns() -> Vec<String> {
    columns::owned(&columns::SUBSTITUTION_COLUMNS)
}

fn default_substitutions() -> BTreeMap<String, String> {
    BTreeMap::from([
        ("km".to_string(), "kilometer".to_string()),
        ("0".to_string(), "4".to_string()),
    ])
}

fn default_fill_missing() -> bool {
    true
}

fn default_missing_placeholder() -> String {
    DEFAULT_MISSING_PLACEHOLDER.to_string()
}

fn default_case_fold_column() -> String {
    columns::MAKE_TEXT.to_string()
}

fn default_upper_case_max_len() -> usize {
    3
}

fn default_title_case_columns() -> Vec<String> {
    vec![columns::BODY_COLOR_TEXT.to_string()]
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self {
            columns: default_substitution_columns(),
            substitutions: default_substitutions(),
            fill_missing: default_fill_missing(),
            missing_placeholder: default_missing_placeholder(),
            case_fold_column: default_case_fold_column(),
            upper_case_max_len: default_upper_case_max_len(),
            title_case_columns: default_title_case_columns(),
        }
    }
}

/// Integrate stage configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntegrateConfig {
    /// Columns removed before renaming
    #[serde(default = "default_drop_columns")]
    pub drop_columns: Vec<String>,

    /// Column renames, applied after dropping
    #[serde(default = "default_rename")]
    pub rename: BTreeMap<String, String>,

    /// Leading column order; remaining columns follow in their original order
    #[serde(default = "default_canonical_order")]
    pub canonical_order: Vec<String>,

    /// Columns coerced to numbers; unconvertible values become missing
    #[serde(default = "default_numeric_columns")]
    pub numeric_columns: Vec<String>,
}

fn default_drop_columns() -> Vec<String> {
    columns::owned(&columns::OBSOLETE_COLUMNS)
}

fn default_rename() -> BTreeMap<String, String> {
    columns::RENAMES
        .iter()
        .map(|(from, to)| (from.to_string(), to.to_string()))
        .collect()
}

fn default_canonical_order() -> Vec<String> {
    columns::owned(&columns::CANONICAL_ORDER)
}

fn default_numeric_columns() -> Vec<String> {
    columns::owned(&columns::NUMERIC_COLUMNS)
}

impl Default for IntegrateConfig {
    fn default() -> Self {
        Self {
            drop_columns: default_drop_columns(),
            rename: default_rename(),
            canonical_order: default_canonical_order(),
            numeric_columns: default_numeric_columns(),
        }
    }
}

/// Main configuration structure
///
/// Represents the `car-pipeline.toml` configuration file format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct PipelineConfig {
    #[serde(default)]
    pub input: InputSection,

    #[serde(default)]
    pub output: OutputSection,

    #[serde(default)]
    pub pipeline: PipelineSection,

    #[serde(default)]
    pub reshape: ReshapeConfig,

    #[serde(default)]
    pub normalize: NormalizeConfig,

    #[serde(default)]
    pub integrate: IntegrateConfig,
}

impl PipelineConfig {
    /// Create a new default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a file and apply environment overrides
    ///
    /// Falls back to defaults if the file does not exist.
    pub fn load(config_path: &Path) -> ConfigResult<Self> {
        let mut config = if config_path.exists() {
            let content = std::fs::read_to_string(config_path)
                .map_err(|e| ConfigError::IoError(format!("Failed to read config: {}", e)))?;

            Self::parse(&content)?
        } else {
            tracing::debug!(
                "No config at {}, using defaults",
                config_path.display()
            );
            Self::default()
        };

        config.apply_env_overrides();

        Ok(config)
    }

    /// Parse configuration from TOML string
    pub fn parse(content: &str) -> ConfigResult<Self> {
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Save configuration to a file
    pub fn save(&self, config_path: &Path) -> ConfigResult<()> {
        let content = self.to_toml()?;

        std::fs::write(config_path, content)
            .map_err(|e| ConfigError::IoError(format!("Failed to write config: {}", e)))?;

        Ok(())
    }

    /// Convert configuration to TOML string
    pub fn to_toml(&self) -> ConfigResult<String> {
        toml::to_string_pretty(self).map_err(|e| {
            ConfigError::SerializationError(format!("Failed to serialize config: {}", e))
        })
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary variable source
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup(ENV_INPUT) {
            self.input.path = PathBuf::from(path);
        }

        if let Some(path) = lookup(ENV_OUTPUT) {
            self.output.path = PathBuf::from(path);
        }

        if let Some(strategy) = lookup(ENV_STRATEGY) {
            match strategy.parse() {
                Ok(strategy) => self.reshape.strategy = strategy,
                Err(e) => tracing::warn!("Ignoring {}: {}", ENV_STRATEGY, e),
            }
        }

        if let Some(strict) = lookup(ENV_STRICT) {
            match strict.parse() {
                Ok(strict) => self.pipeline.strict = strict,
                Err(e) => tracing::warn!("Ignoring {}={:?}: {}", ENV_STRICT, strict, e),
            }
        }
    }

    /// Drop list for the integrate stage, including the record index column
    /// produced by the unstack strategy
    pub fn effective_drop_columns(&self) -> Vec<String> {
        let mut drop = self.integrate.drop_columns.clone();
        if self.reshape.strategy == ReshapeStrategy::Unstack
            && !drop.iter().any(|c| c == columns::RECORD_INDEX)
        {
            drop.insert(0, columns::RECORD_INDEX.to_string());
        }
        drop
    }
}

/// Generate a sample configuration file content
pub fn sample_config() -> &'static str {
    r#"# Car listing pipeline configuration
# Every key is optional; omitted keys use the defaults shown here.

[input]
path = "supplier_car.json"

[output]
path = "task_output.xlsx"

[output.sheets]
pre_process = "pre-process"
normalization = "normalization"
integration = "integration"

[pipeline]
# Fail when a configured column is missing from the data
strict = true

[reshape]
# "pivot": one row per (MakeText, TypeName, ModelText)
# "unstack": one row per input record
strategy = "pivot"
key_columns = ["MakeText", "TypeName", "ModelText"]
attribute_name_column = "Attribute Names"
attribute_value_column = "Attribute Values"
split_source_column = "ConsumptionTotalText"
split_delimiter = "l/100"
split_targets = ["mileage", "mileage_unit"]

[normalize]
columns = ["ModelText", "BodyColorText", "BodyTypeText", "ConditionTypeText",
           "FirstRegMonth", "FirstRegYear", "mileage", "City", "mileage_unit"]
fill_missing = true
missing_placeholder = "null"
case_fold_column = "MakeText"
upper_case_max_len = 3
title_case_columns = ["BodyColorText"]

[normalize.substitutions]
km = "kilometer"
"0" = "4"

[integrate]
drop_columns = ["Ccm", "Co2EmissionText", "ConsumptionRatingText", "Doors",
                "DriveTypeText", "FuelTypeText", "Hp", "InteriorColorText", "Km",
                "Properties", "Seats", "TransmissionTypeText", "ConsumptionTotalText"]
canonical_order = ["carType", "color", "condition", "city", "make",
                   "manufacture_year", "mileage", "mileage_unit", "model",
                   "model_variant", "manufacture_month"]
numeric_columns = ["mileage", "manufacture_year", "manufacture_month"]

[integrate.rename]
BodyTypeText = "carType"
BodyColorText = "color"
ConditionTypeText = "condition"
City = "city"
MakeText = "make"
FirstRegYear = "manufacture_year"
ModelText = "model_variant"
TypeName = "model"
FirstRegMonth = "manufacture_month"
"#
}
