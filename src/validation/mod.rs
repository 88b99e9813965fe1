//! Validation functionality
//!
//! Provides validation logic for:
//! - Pipeline configuration (column lists, split settings)
//! - Worksheet names

pub mod config;

pub use config::{
    ConfigValidationError, ConfigValidationResult, validate_config, validate_sheet_name,
};
