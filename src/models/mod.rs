//! Models module
//!
//! Defines the in-memory table passed between pipeline stages and the
//! column names used by the supplier feed and the business schema.

pub mod columns;
pub mod table;
pub mod value;

pub use table::{ColumnSummary, Table, TableError, TableResult, TableSummary};
pub use value::CellValue;
