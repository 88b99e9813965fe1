//! Integrate stage: map the normalized table onto the business schema

use std::collections::HashSet;

use polars::chunked_array::cast::CastOptions;
use polars::prelude::*;
use tracing::{debug, warn};

use super::{TransformError, require_column};
use crate::config::IntegrateConfig;
use crate::models::Table;

const STAGE: &str = "integrate";

/// Drop obsolete columns, rename, reorder and coerce numeric columns
///
/// Columns named in `canonical_order` come first in that order; every other
/// remaining column follows in its previous order. In lenient mode a
/// canonical or numeric column missing from the data is added with every
/// value missing, so the output always carries the full business schema.
/// Numeric coercion turns values that cannot be read as numbers into
/// missing values.
pub fn integrate(
    table: &Table,
    config: &IntegrateConfig,
    strict: bool,
) -> Result<Table, TransformError> {
    let mut integrated = table.clone();

    for column in &config.drop_columns {
        if require_column(&integrated, STAGE, column, strict)? {
            integrated.drop_column(column)?;
        }
    }

    let mut rename = config.rename.clone();
    rename.retain(|from, _| integrated.has_column(from));
    if rename.len() != config.rename.len() {
        for from in config.rename.keys().filter(|from| !rename.contains_key(*from)) {
            require_column(&integrated, STAGE, from, strict)?;
        }
    }
    integrated.rename_columns(&rename)?;

    let order = column_order(&mut integrated, &config.canonical_order, strict)?;
    let integrated = integrated.select(&order)?;
    let mut frame = integrated.into_frame();

    for column in &config.numeric_columns {
        if frame.get_column_index(column).is_none() {
            if strict {
                return Err(TransformError::MissingColumn {
                    stage: STAGE,
                    column: column.clone(),
                });
            }
            warn!("{}: adding missing numeric column '{}'", STAGE, column);
        }
        let lost = coerce_numeric(&mut frame, column)?;
        if lost > 0 {
            warn!(
                "{}: {} value(s) in '{}' are not numeric and were set to missing",
                STAGE, lost, column
            );
        }
    }

    let integrated = Table::from(frame);
    debug!("Integrated columns: {:?}", integrated.columns());
    Ok(integrated)
}

/// Canonical columns first, then the rest in their current order
///
/// Absent canonical columns are an error in strict mode and are added as
/// missing values otherwise.
fn column_order(
    table: &mut Table,
    canonical: &[String],
    strict: bool,
) -> Result<Vec<String>, TransformError> {
    let mut order = Vec::with_capacity(table.num_columns());
    let mut seen = HashSet::new();

    for column in canonical {
        if !seen.insert(column.as_str()) {
            continue;
        }
        if !table.has_column(column) {
            if strict {
                return Err(TransformError::MissingColumn {
                    stage: STAGE,
                    column: column.clone(),
                });
            }
            warn!("{}: adding missing column '{}'", STAGE, column);
            table.add_null_column(column)?;
        }
        order.push(column.clone());
    }

    let rest: Vec<String> = table
        .columns()
        .into_iter()
        .filter(|c| !seen.contains(c.as_str()))
        .collect();
    order.extend(rest);
    Ok(order)
}

/// Cast a column to `f64`, trimming text first; returns how many values
/// were lost. An absent column is created with every value missing.
fn coerce_numeric(frame: &mut DataFrame, name: &str) -> PolarsResult<usize> {
    let source = match frame.column(name) {
        Ok(column) => match column.str() {
            Ok(text) => text
                .into_iter()
                .map(|v| v.map(str::trim))
                .collect::<StringChunked>()
                .with_name(name.into())
                .into_series(),
            Err(_) => column.as_materialized_series().clone(),
        },
        Err(_) => Series::full_null(name.into(), frame.height(), &DataType::Float64),
    };

    let numbers = source.cast_with_options(&DataType::Float64, CastOptions::NonStrict)?;
    let lost = numbers.null_count().saturating_sub(source.null_count());
    frame.with_column(numbers)?;
    Ok(lost)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CellValue, columns};
    use std::collections::BTreeMap;

    fn normalized() -> Table {
        Table::from_rows(
            columns::owned(&["Hp", "MakeText", "Extra", "FirstRegYear", "mileage"]),
            vec![
                vec![
                    CellValue::text("150"),
                    CellValue::text("BMW"),
                    CellValue::text("x"),
                    CellValue::text("1999"),
                    CellValue::text("9.1 "),
                ],
                vec![
                    CellValue::Null,
                    CellValue::text("Audi"),
                    CellValue::Null,
                    CellValue::text("N/A"),
                    CellValue::text("null"),
                ],
            ],
        )
        .unwrap()
    }

    fn config() -> IntegrateConfig {
        IntegrateConfig {
            drop_columns: columns::owned(&["Hp"]),
            rename: BTreeMap::from([
                ("MakeText".to_string(), "make".to_string()),
                ("FirstRegYear".to_string(), "manufacture_year".to_string()),
            ]),
            canonical_order: columns::owned(&["mileage", "make", "manufacture_year"]),
            numeric_columns: columns::owned(&["mileage", "manufacture_year"]),
        }
    }

    #[test]
    fn test_drop_rename_reorder() {
        let table = integrate(&normalized(), &config(), true).unwrap();
        assert_eq!(
            table.columns(),
            &["mileage", "make", "manufacture_year", "Extra"]
        );
        assert_eq!(table.get(0, "make"), Some(CellValue::text("BMW")));
    }

    #[test]
    fn test_leftover_columns_keep_their_order() {
        let table = Table::from_rows(
            columns::owned(&["Zeta", "MakeText", "Alpha", "mileage", "FirstRegYear"]),
            vec![vec![
                CellValue::text("z"),
                CellValue::text("BMW"),
                CellValue::text("a"),
                CellValue::text("7"),
                CellValue::text("2001"),
            ]],
        )
        .unwrap();
        let mut config = config();
        config.drop_columns.clear();

        let table = integrate(&table, &config, true).unwrap();
        assert_eq!(
            table.columns(),
            &["mileage", "make", "manufacture_year", "Zeta", "Alpha"]
        );
    }

    #[test]
    fn test_numeric_coercion() {
        let table = integrate(&normalized(), &config(), true).unwrap();
        assert_eq!(
            table.get(0, "manufacture_year"),
            Some(CellValue::Float(1999.0))
        );
        assert_eq!(table.get(0, "mileage"), Some(CellValue::Float(9.1)));
        assert_eq!(table.get(1, "manufacture_year"), Some(CellValue::Null));
        assert_eq!(table.get(1, "mileage"), Some(CellValue::Null));
        // Non-numeric columns are untouched
        assert_eq!(table.get(0, "Extra"), Some(CellValue::text("x")));
        assert_eq!(table.get(1, "Extra"), Some(CellValue::Null));
        assert_eq!(
            table.frame().column("mileage").unwrap().dtype(),
            &DataType::Float64
        );
    }

    #[test]
    fn test_coerce_reports_lost_values() {
        let mut frame = normalized().into_frame();
        assert_eq!(coerce_numeric(&mut frame, "FirstRegYear").unwrap(), 1);
        assert_eq!(coerce_numeric(&mut frame, "Hp").unwrap(), 0);
        assert_eq!(coerce_numeric(&mut frame, "Seats").unwrap(), 0);
        assert_eq!(frame.column("Seats").unwrap().null_count(), 2);
    }

    #[test]
    fn test_duplicate_canonical_entry_listed_once() {
        let mut config = config();
        config.canonical_order.push("make".to_string());
        let table = integrate(&normalized(), &config, true).unwrap();
        assert_eq!(table.num_columns(), 4);
    }

    #[test]
    fn test_missing_columns_strictness() {
        let mut config = config();
        config.drop_columns.push("Seats".to_string());
        config
            .rename
            .insert("City".to_string(), "city".to_string());
        config.canonical_order.push("city".to_string());

        let err = integrate(&normalized(), &config, true).unwrap_err();
        assert!(matches!(
            err,
            TransformError::MissingColumn { stage: "integrate", ref column } if column == "Seats"
        ));

        // Lenient mode still yields the whole canonical schema
        let table = integrate(&normalized(), &config, false).unwrap();
        assert_eq!(
            table.columns(),
            &["mileage", "make", "manufacture_year", "city", "Extra"]
        );
        assert!(
            table
                .column_values("city")
                .unwrap()
                .iter()
                .all(CellValue::is_null)
        );
    }

    #[test]
    fn test_missing_numeric_column_added_in_lenient_mode() {
        let mut config = config();
        config.numeric_columns.push("manufacture_month".to_string());

        let err = integrate(&normalized(), &config, true).unwrap_err();
        assert!(matches!(
            err,
            TransformError::MissingColumn { ref column, .. } if column == "manufacture_month"
        ));

        let table = integrate(&normalized(), &config, false).unwrap();
        assert_eq!(table.get(0, "manufacture_month"), Some(CellValue::Null));
        assert_eq!(
            table.frame().column("manufacture_month").unwrap().dtype(),
            &DataType::Float64
        );
    }

    #[test]
    fn test_rename_collision() {
        let mut config = config();
        config
            .rename
            .insert("Extra".to_string(), "make".to_string());
        let err = integrate(&normalized(), &config, true).unwrap_err();
        assert!(matches!(err, TransformError::Table(_)));
    }

    #[test]
    fn test_input_untouched() {
        let input = normalized();
        let _ = integrate(&input, &config(), true).unwrap();
        assert_eq!(input, normalized());
    }
}
