//! Reshape stage: long-format attribute rows to wide columns
//!
//! Supplier records carry one vehicle property each, as an attribute
//! name/value pair. This stage turns attribute names into columns using the
//! configured [`ReshapeStrategy`] and then splits the consumption text into
//! mileage and unit.
//!
//! Missing values are left missing by both strategies; no placeholder is
//! written before reshaping.

use std::collections::BTreeSet;

use polars::prelude::pivot::pivot_stable;
use polars::prelude::*;
use tracing::debug;

use super::{TransformError, require_column};
use crate::config::{ReshapeConfig, ReshapeStrategy};
use crate::models::{Table, columns};

const STAGE: &str = "reshape";

/// Reshape a raw record table into a wide table
pub fn reshape(
    table: &Table,
    config: &ReshapeConfig,
    strict: bool,
) -> Result<Table, TransformError> {
    check_sources(table, config)?;

    let mut reshaped = match config.strategy {
        ReshapeStrategy::Pivot => pivot(table, config)?,
        ReshapeStrategy::Unstack => unstack(table, config)?,
    };

    split_column(
        &mut reshaped,
        &config.split_source_column,
        &config.split_delimiter,
        &config.split_targets,
        strict,
    )?;

    Ok(reshaped)
}

/// Key, attribute name and attribute value columns must all be present
fn check_sources(table: &Table, config: &ReshapeConfig) -> Result<(), TransformError> {
    let sources = config
        .key_columns
        .iter()
        .chain([&config.attribute_name_column, &config.attribute_value_column]);
    for column in sources {
        if !table.has_column(column) {
            return Err(TransformError::MissingColumn {
                stage: STAGE,
                column: column.clone(),
            });
        }
    }
    Ok(())
}

/// One row per distinct key; each attribute takes the first non-null value
/// seen for that key. Rows are sorted by key with missing keys last,
/// attribute columns by name. Records without an attribute name are ignored.
fn pivot(table: &Table, config: &ReshapeConfig) -> Result<Table, TransformError> {
    let name = config.attribute_name_column.as_str();
    let value = config.attribute_value_column.as_str();

    let mut group: Vec<Expr> = config.key_columns.iter().map(|c| col(c.as_str())).collect();
    group.push(col(name));

    // First non-null value per key and attribute, so every pivot cell has
    // exactly one candidate
    let long = table
        .frame()
        .clone()
        .lazy()
        .with_column(col(name).cast(DataType::String))
        .filter(col(name).is_not_null())
        .group_by_stable(group)
        .agg([col(value).drop_nulls().first()])
        .collect()?;

    let wide = if long.height() == 0 {
        long.select(config.key_columns.iter().map(String::as_str))?
    } else {
        pivot_stable(
            &long,
            [name],
            Some(config.key_columns.clone()),
            Some([value]),
            true,
            None,
            None,
        )?
    };

    let wide = wide.sort(
        config.key_columns.clone(),
        SortMultipleOptions::default()
            .with_nulls_last(true)
            .with_maintain_order(true),
    )?;

    debug!(
        "Pivoted {} records into {} keys and {} attributes",
        table.num_rows(),
        wide.height(),
        wide.width() - config.key_columns.len()
    );
    Ok(Table::from(wide))
}

/// One row per input record, labelled by its position in a leading record
/// index column. Each row carries only its own attribute value.
fn unstack(table: &Table, config: &ReshapeConfig) -> Result<Table, TransformError> {
    let name = config.attribute_name_column.as_str();
    let value = config.attribute_value_column.as_str();

    let names = table.frame().column(name)?.cast(&DataType::String)?;
    let attributes: BTreeSet<String> = names
        .str()?
        .into_iter()
        .flatten()
        .map(str::to_string)
        .collect();

    let mut selection = vec![col(columns::RECORD_INDEX).cast(DataType::Int64)];
    selection.extend(config.key_columns.iter().map(|c| col(c.as_str())));
    selection.extend(attributes.iter().map(|attribute| {
        when(col(name).cast(DataType::String).eq(lit(attribute.as_str())))
            .then(col(value))
            .otherwise(lit(NULL))
            .alias(attribute.as_str())
    }));

    let wide = table
        .frame()
        .with_row_index(columns::RECORD_INDEX.into(), None)?
        .lazy()
        .select(selection)
        .collect()?;

    debug!(
        "Unstacked {} records over {} attributes",
        wide.height(),
        attributes.len()
    );
    Ok(Table::from(wide))
}

/// Split a text column on the first occurrence of `delimiter`
///
/// The segment before the delimiter goes to `targets[0]`, the segment after
/// to `targets[1]`. Values without the delimiter keep the whole text in the
/// first target and a missing value in the second. Segments are not
/// trimmed. Targets are appended, or overwritten if they already exist.
pub fn split_column(
    table: &mut Table,
    source: &str,
    delimiter: &str,
    targets: &[String],
    strict: bool,
) -> Result<(), TransformError> {
    let [first, second] = targets else {
        return Err(TransformError::InvalidArgument {
            stage: STAGE,
            reason: format!("split needs exactly 2 target columns, got {}", targets.len()),
        });
    };
    if delimiter.is_empty() {
        return Err(TransformError::InvalidArgument {
            stage: STAGE,
            reason: "split delimiter cannot be empty".to_string(),
        });
    }

    let (before, after) = if require_column(table, STAGE, source, strict)? {
        let parts = || {
            col(source)
                .cast(DataType::String)
                .str()
                .splitn(lit(delimiter), 2)
                .struct_()
        };
        (
            parts().field_by_name("field_0"),
            parts().field_by_name("field_1"),
        )
    } else {
        (
            lit(NULL).cast(DataType::String),
            lit(NULL).cast(DataType::String),
        )
    };

    let frame = table
        .frame()
        .clone()
        .lazy()
        .with_columns([before.alias(first.as_str()), after.alias(second.as_str())])
        .collect()?;
    *table = Table::from(frame);
    Ok(())
}
