//! Cell value model for in-memory tables

use polars::prelude::AnyValue;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single cell in a [`Table`](super::Table)
///
/// `Null` is the missing-value marker used throughout the pipeline. It is
/// distinct from any placeholder text such as `"null"`.
///
/// # Example
///
/// ```rust
/// use car_listing_pipeline::models::CellValue;
///
/// assert!(CellValue::default().is_null());
/// assert_eq!(CellValue::from("N/A"), CellValue::text("N/A"));
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    /// Missing value
    #[default]
    Null,
    /// Boolean value
    Bool(bool),
    /// Integer value
    Int(i64),
    /// Floating point value
    Float(f64),
    /// Text value
    Text(String),
}

impl CellValue {
    /// Create a text cell
    pub fn text(value: impl Into<String>) -> Self {
        CellValue::Text(value.into())
    }

    /// Convert a JSON value into a cell
    ///
    /// Arrays and objects are kept as their compact JSON text.
    pub fn from_json(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => CellValue::Null,
            serde_json::Value::Bool(b) => CellValue::Bool(*b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    CellValue::Int(i)
                } else if let Some(f) = n.as_f64() {
                    CellValue::Float(f)
                } else {
                    CellValue::Text(n.to_string())
                }
            }
            serde_json::Value::String(s) => CellValue::Text(s.clone()),
            other => CellValue::Text(other.to_string()),
        }
    }

    /// Whether this cell is the missing-value marker
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Null => Ok(()),
            CellValue::Bool(b) => write!(f, "{}", b),
            CellValue::Int(i) => write!(f, "{}", i),
            CellValue::Float(v) => write!(f, "{}", v),
            CellValue::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<AnyValue<'_>> for CellValue {
    fn from(value: AnyValue<'_>) -> Self {
        match value {
            AnyValue::Null => CellValue::Null,
            AnyValue::Boolean(b) => CellValue::Bool(b),
            AnyValue::String(s) => CellValue::text(s),
            AnyValue::StringOwned(s) => CellValue::text(s.as_str()),
            AnyValue::Int32(i) => CellValue::Int(i.into()),
            AnyValue::Int64(i) => CellValue::Int(i),
            AnyValue::UInt32(i) => CellValue::Int(i.into()),
            AnyValue::UInt64(i) => i64::try_from(i).map_or(CellValue::Float(i as f64), CellValue::Int),
            AnyValue::Float32(f) => CellValue::Float(f.into()),
            AnyValue::Float64(f) => CellValue::Float(f),
            other => CellValue::Text(other.to_string()),
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        CellValue::Int(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Float(value)
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(CellValue::Null)
    }
}
