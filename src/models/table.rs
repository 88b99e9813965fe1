//! In-memory table shared by every pipeline stage
//!
//! A [`Table`] wraps a polars [`DataFrame`]. Rows are labelled by position;
//! the label is written as the first column of every spreadsheet sheet.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use polars::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::value::CellValue;

/// Errors raised while building or editing a [`Table`]
#[derive(Debug, Clone, Error, PartialEq, Serialize, Deserialize)]
pub enum TableError {
    #[error("Duplicate column: {0}")]
    DuplicateColumn(String),

    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    #[error("Row width mismatch: expected {expected} values, got {actual}")]
    RowWidth { expected: usize, actual: usize },

    #[error("Column '{column}' has {actual} values, table has {expected} rows")]
    ColumnLength {
        column: String,
        expected: usize,
        actual: usize,
    },

    #[error("Frame error: {0}")]
    Frame(String),
}

impl From<PolarsError> for TableError {
    fn from(err: PolarsError) -> Self {
        TableError::Frame(err.to_string())
    }
}

/// Result type for table operations
pub type TableResult<T> = Result<T, TableError>;

/// Column-oriented table backed by a polars `DataFrame`
///
/// Column names are unique.
///
/// # Example
///
/// ```rust
/// use car_listing_pipeline::models::{CellValue, Table};
///
/// let table = Table::from_rows(
///     vec!["make".to_string(), "model".to_string()],
///     vec![vec![CellValue::text("bmw"), CellValue::text("x5")]],
/// )
/// .unwrap();
/// assert_eq!(table.shape(), (1, 2));
/// assert_eq!(table.get(0, "make"), Some(CellValue::text("bmw")));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Table {
    frame: DataFrame,
}

impl Table {
    /// Build a table from named columns of cells
    ///
    /// Each column gets the narrowest polars type holding all of its
    /// values: `i64`, `f64`, `bool`, or text when the values are mixed.
    pub fn from_columns(columns: Vec<(String, Vec<CellValue>)>) -> TableResult<Self> {
        let height = columns.first().map_or(0, |(_, cells)| cells.len());
        let mut seen = HashSet::new();
        let mut series = Vec::with_capacity(columns.len());

        for (name, cells) in &columns {
            if !seen.insert(name.as_str()) {
                return Err(TableError::DuplicateColumn(name.clone()));
            }
            if cells.len() != height {
                return Err(TableError::ColumnLength {
                    column: name.clone(),
                    expected: height,
                    actual: cells.len(),
                });
            }
            series.push(cells_to_series(name, cells).into_column());
        }

        Ok(Self {
            frame: DataFrame::new(series)?,
        })
    }

    /// Build a table from rows of cells
    pub fn from_rows(columns: Vec<String>, rows: Vec<Vec<CellValue>>) -> TableResult<Self> {
        let mut cells: Vec<Vec<CellValue>> = vec![Vec::with_capacity(rows.len()); columns.len()];
        for row in rows {
            if row.len() != columns.len() {
                return Err(TableError::RowWidth {
                    expected: columns.len(),
                    actual: row.len(),
                });
            }
            for (column, value) in cells.iter_mut().zip(row) {
                column.push(value);
            }
        }
        Self::from_columns(columns.into_iter().zip(cells).collect())
    }

    /// Borrow the underlying frame
    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn into_frame(self) -> DataFrame {
        self.frame
    }

    /// Column names in display order
    pub fn columns(&self) -> Vec<String> {
        self.frame
            .get_column_names()
            .into_iter()
            .map(|name| name.to_string())
            .collect()
    }

    pub fn num_rows(&self) -> usize {
        self.frame.height()
    }

    pub fn num_columns(&self) -> usize {
        self.frame.width()
    }

    /// `(rows, columns)`
    pub fn shape(&self) -> (usize, usize) {
        (self.num_rows(), self.num_columns())
    }

    pub fn is_empty(&self) -> bool {
        self.frame.height() == 0
    }

    /// Position of a column, if present
    pub fn column_position(&self, name: &str) -> Option<usize> {
        self.frame.get_column_index(name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_position(name).is_some()
    }

    /// Read a cell by row position and column name
    pub fn get(&self, row: usize, column: &str) -> Option<CellValue> {
        let column = self.frame.column(column).ok()?;
        if row >= column.len() {
            return None;
        }
        column.get(row).ok().map(CellValue::from)
    }

    /// All values of one column
    pub fn column_values(&self, name: &str) -> TableResult<Vec<CellValue>> {
        let column = self.require(name)?;
        (0..column.len())
            .map(|row| Ok(CellValue::from(column.get(row)?)))
            .collect()
    }

    /// Replace a column's values, appending the column if it does not exist
    pub fn set_column(&mut self, name: &str, values: Vec<CellValue>) -> TableResult<()> {
        if self.num_columns() > 0 && values.len() != self.num_rows() {
            return Err(TableError::ColumnLength {
                column: name.to_string(),
                expected: self.num_rows(),
                actual: values.len(),
            });
        }
        self.frame.with_column(cells_to_series(name, &values))?;
        Ok(())
    }

    /// Append a column of missing values, typed as text
    pub fn add_null_column(&mut self, name: &str) -> TableResult<()> {
        if self.has_column(name) {
            return Err(TableError::DuplicateColumn(name.to_string()));
        }
        let nulls = Series::full_null(name.into(), self.num_rows(), &DataType::String);
        self.frame.with_column(nulls)?;
        Ok(())
    }

    /// Rewrite the values of a text column
    ///
    /// Returns `false`, leaving the column as is, when it does not hold text.
    /// Missing values are passed to `f` as `None`.
    pub fn map_text<F>(&mut self, name: &str, f: F) -> TableResult<bool>
    where
        F: Fn(Option<&str>) -> Option<String>,
    {
        let column = self.require(name)?;
        let Ok(text) = column.str() else {
            return Ok(false);
        };
        let mapped: StringChunked = text.into_iter().map(&f).collect();
        self.frame
            .with_column(mapped.with_name(name.into()).into_series())?;
        Ok(true)
    }

    /// Remove a column
    pub fn drop_column(&mut self, name: &str) -> TableResult<()> {
        self.require(name)?;
        self.frame.drop_in_place(name)?;
        Ok(())
    }

    /// Rename columns all at once; columns absent from the mapping keep their name
    pub fn rename_columns(&mut self, mapping: &BTreeMap<String, String>) -> TableResult<()> {
        let renamed: Vec<String> = self
            .columns()
            .into_iter()
            .map(|c| mapping.get(&c).cloned().unwrap_or(c))
            .collect();

        let mut seen = HashSet::new();
        for name in &renamed {
            if !seen.insert(name.as_str()) {
                return Err(TableError::DuplicateColumn(name.clone()));
            }
        }

        let columns = self
            .frame
            .get_columns()
            .iter()
            .zip(&renamed)
            .map(|(column, name)| {
                let mut column = column.clone();
                column.rename(name.as_str().into());
                column
            })
            .collect();
        self.frame = DataFrame::new(columns)?;
        Ok(())
    }

    /// Build a new table with the given columns, in the given order
    pub fn select(&self, columns: &[String]) -> TableResult<Table> {
        for column in columns {
            self.require(column)?;
        }
        let frame = self.frame.select(columns.iter().map(String::as_str))?;
        Ok(Table { frame })
    }

    /// Schema summary of the table, similar to a dataframe `info()`
    pub fn summary(&self) -> TableSummary {
        let columns = self
            .frame
            .get_columns()
            .iter()
            .map(|column| ColumnSummary {
                name: column.name().to_string(),
                non_null: column.len() - column.null_count(),
                dtype: column.dtype().to_string(),
            })
            .collect();

        TableSummary {
            rows: self.num_rows(),
            columns,
        }
    }

    fn require(&self, name: &str) -> TableResult<&Column> {
        self.frame
            .column(name)
            .map_err(|_| TableError::ColumnNotFound(name.to_string()))
    }
}

impl From<DataFrame> for Table {
    fn from(frame: DataFrame) -> Self {
        Self { frame }
    }
}

impl PartialEq for Table {
    fn eq(&self, other: &Self) -> bool {
        self.frame.equals_missing(&other.frame)
    }
}

/// Narrowest series type holding every cell of a column
fn cells_to_series(name: &str, cells: &[CellValue]) -> Series {
    let present = || cells.iter().filter(|c| !c.is_null());

    if present().next().is_some() && present().all(|c| matches!(c, CellValue::Int(_))) {
        let values: Vec<Option<i64>> = cells
            .iter()
            .map(|c| match c {
                CellValue::Int(i) => Some(*i),
                _ => None,
            })
            .collect();
        return Series::new(name.into(), values);
    }

    if present().next().is_some()
        && present().all(|c| matches!(c, CellValue::Int(_) | CellValue::Float(_)))
    {
        let values: Vec<Option<f64>> = cells
            .iter()
            .map(|c| match c {
                CellValue::Int(i) => Some(*i as f64),
                CellValue::Float(f) => Some(*f),
                _ => None,
            })
            .collect();
        return Series::new(name.into(), values);
    }

    if present().next().is_some() && present().all(|c| matches!(c, CellValue::Bool(_))) {
        let values: Vec<Option<bool>> = cells
            .iter()
            .map(|c| match c {
                CellValue::Bool(b) => Some(*b),
                _ => None,
            })
            .collect();
        return Series::new(name.into(), values);
    }

    let values: Vec<Option<String>> = cells
        .iter()
        .map(|c| match c {
            CellValue::Null => None,
            CellValue::Text(s) => Some(s.clone()),
            other => Some(other.to_string()),
        })
        .collect();
    Series::new(name.into(), values)
}

/// Per-column entry of a [`TableSummary`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSummary {
    pub name: String,
    pub non_null: usize,
    pub dtype: String,
}

/// Row/column counts and per-column schema information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSummary {
    pub rows: usize,
    pub columns: Vec<ColumnSummary>,
}

impl fmt::Display for TableSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Shape: ({}, {})", self.rows, self.columns.len())?;
        let width = self
            .columns
            .iter()
            .map(|c| c.name.chars().count())
            .max()
            .unwrap_or(0)
            .max("Column".len());
        writeln!(f, " #   {:<width$}  Non-Null Count  Dtype", "Column")?;
        for (i, column) in self.columns.iter().enumerate() {
            writeln!(
                f,
                " {:<3} {:<width$}  {:>5} non-null  {}",
                i, column.name, column.non_null, column.dtype
            )?;
        }
        Ok(())
    }
}
