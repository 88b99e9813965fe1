//! Normalize stage: value substitutions and string case rules

use std::collections::BTreeMap;

use polars::prelude::*;
use tracing::debug;

use super::{TransformError, require_column};
use crate::config::NormalizeConfig;
use crate::models::Table;

const STAGE: &str = "normalize";

/// Normalize a reshaped table
///
/// 1. Exact-match substitutions on the configured columns; missing values
///    there become the placeholder when `fill_missing` is set.
/// 2. Case folding of the case-fold column (see [`fold_case`]).
/// 3. Title casing of the title-case columns, keeping missing values (and
///    the placeholder) missing.
pub fn normalize(
    table: &Table,
    config: &NormalizeConfig,
    strict: bool,
) -> Result<Table, TransformError> {
    let placeholder = config
        .fill_missing
        .then_some(config.missing_placeholder.as_str());

    let mut substitutions = Vec::with_capacity(config.columns.len());
    for column in &config.columns {
        if require_column(table, STAGE, column, strict)? {
            substitutions.push(substitute(column, &config.substitutions, placeholder));
        }
    }
    let mut normalized = Table::from(
        table
            .frame()
            .clone()
            .lazy()
            .with_columns(substitutions)
            .collect()?,
    );

    if require_column(&normalized, STAGE, &config.case_fold_column, strict)? {
        normalized.map_text(&config.case_fold_column, |value| {
            value.map(|s| fold_case(s, config.upper_case_max_len))
        })?;
    }

    for column in &config.title_case_columns {
        if !require_column(&normalized, STAGE, column, strict)? {
            continue;
        }
        normalized.map_text(column, |value| match value {
            Some(s) if Some(s) == placeholder => None,
            other => other.map(title_case),
        })?;
    }

    debug!(
        "Normalized {} columns, case-folded '{}'",
        config.columns.len(),
        config.case_fold_column
    );
    Ok(normalized)
}

/// Exact-match replacement of whole values, read as text
///
/// Every lookup is made against the original value, so a replacement is
/// never substituted again.
fn substitute(
    column: &str,
    substitutions: &BTreeMap<String, String>,
    placeholder: Option<&str>,
) -> Expr {
    let original = col(column).cast(DataType::String);
    let mut expr = original.clone();
    for (from, to) in substitutions {
        expr = when(original.clone().eq(lit(from.as_str())))
            .then(lit(to.as_str()))
            .otherwise(expr);
    }
    if let Some(placeholder) = placeholder {
        expr = expr.fill_null(lit(placeholder));
    }
    expr.alias(column)
}

/// Upper-case values up to `max_len` characters, title-case longer ones
///
/// ```rust
/// use car_listing_pipeline::transform::fold_case;
///
/// assert_eq!(fold_case("bmw", 3), "BMW");
/// assert_eq!(fold_case("mercedes-benz", 3), "Mercedes-Benz");
/// ```
pub fn fold_case(value: &str, max_len: usize) -> String {
    if value.chars().count() <= max_len {
        value.to_uppercase()
    } else {
        title_case(value)
    }
}

/// Capitalize the first letter of every word and lower-case the rest
///
/// A word starts at any letter that does not follow another letter, so
/// `"rolls-royce"` becomes `"Rolls-Royce"` and `"4x4"` becomes `"4X4"`.
pub fn title_case(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut previous_is_letter = false;

    for c in value.chars() {
        if c.is_alphabetic() {
            if previous_is_letter {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            previous_is_letter = true;
        } else {
            out.push(c);
            previous_is_letter = false;
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CellValue, columns};

    fn reshaped() -> Table {
        Table::from_rows(
            columns::owned(&["MakeText", "ModelText", "BodyColorText", "mileage_unit"]),
            vec![
                vec![
                    CellValue::text("bmw"),
                    CellValue::text("0"),
                    CellValue::text("schwarz mét."),
                    CellValue::text("km"),
                ],
                vec![
                    CellValue::text("mercedes-benz"),
                    CellValue::Null,
                    CellValue::Null,
                    CellValue::text("mi"),
                ],
                vec![
                    CellValue::Null,
                    CellValue::text("4"),
                    CellValue::text("ROT"),
                    CellValue::Null,
                ],
            ],
        )
        .unwrap()
    }

    fn config() -> NormalizeConfig {
        NormalizeConfig {
            columns: columns::owned(&["ModelText", "BodyColorText", "mileage_unit"]),
            ..NormalizeConfig::default()
        }
    }

    #[test]
    fn test_substitutions() {
        let table = normalize(&reshaped(), &config(), true).unwrap();

        assert_eq!(table.get(0, "mileage_unit"), Some(CellValue::text("kilometer")));
        assert_eq!(table.get(1, "mileage_unit"), Some(CellValue::text("mi")));
        assert_eq!(table.get(2, "mileage_unit"), Some(CellValue::text("null")));
        assert_eq!(table.get(0, "ModelText"), Some(CellValue::text("4")));
        assert_eq!(table.get(2, "ModelText"), Some(CellValue::text("4")));
    }

    #[test]
    fn test_substitution_not_chained() {
        let mut config = config();
        config
            .substitutions
            .insert("4".to_string(), "four".to_string());
        let table = normalize(&reshaped(), &config, true).unwrap();

        // "0" becomes "4" and stays there; an original "4" is replaced
        assert_eq!(table.get(0, "ModelText"), Some(CellValue::text("4")));
        assert_eq!(table.get(2, "ModelText"), Some(CellValue::text("four")));
    }

    #[test]
    fn test_no_fill_keeps_missing() {
        let config = NormalizeConfig {
            fill_missing: false,
            ..config()
        };
        let table = normalize(&reshaped(), &config, true).unwrap();
        assert_eq!(table.get(1, "ModelText"), Some(CellValue::Null));
    }

    #[test]
    fn test_case_folding() {
        let table = normalize(&reshaped(), &config(), true).unwrap();

        assert_eq!(table.get(0, "MakeText"), Some(CellValue::text("BMW")));
        assert_eq!(
            table.get(1, "MakeText"),
            Some(CellValue::text("Mercedes-Benz"))
        );
        assert_eq!(table.get(2, "MakeText"), Some(CellValue::Null));
    }

    #[test]
    fn test_title_case_keeps_missing() {
        let table = normalize(&reshaped(), &config(), true).unwrap();

        assert_eq!(
            table.get(0, "BodyColorText"),
            Some(CellValue::text("Schwarz Mét."))
        );
        // Substituted to the placeholder first, then restored to missing
        assert_eq!(table.get(1, "BodyColorText"), Some(CellValue::Null));
        assert_eq!(table.get(2, "BodyColorText"), Some(CellValue::text("Rot")));
    }

    #[test]
    fn test_input_untouched() {
        let input = reshaped();
        let _ = normalize(&input, &config(), true).unwrap();
        assert_eq!(input, reshaped());
    }

    #[test]
    fn test_missing_column_strictness() {
        let mut config = config();
        config.columns.push("City".to_string());

        let err = normalize(&reshaped(), &config, true).unwrap_err();
        assert!(matches!(
            err,
            TransformError::MissingColumn { stage: "normalize", .. }
        ));
        assert!(normalize(&reshaped(), &config, false).is_ok());
    }

    #[test]
    fn test_fold_case() {
        assert_eq!(fold_case("bmw", 3), "BMW");
        assert_eq!(fold_case("vw", 3), "VW");
        assert_eq!(fold_case("mercedes", 3), "Mercedes");
        assert_eq!(fold_case("ALFA ROMEO", 3), "Alfa Romeo");
        assert_eq!(fold_case("", 3), "");
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("rolls-royce"), "Rolls-Royce");
        assert_eq!(title_case("4x4 drive"), "4X4 Drive");
        assert_eq!(title_case("grün"), "Grün");
    }
}
