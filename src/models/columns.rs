//! Column names of the supplier feed and of the canonical business schema

// Supplier record fields
pub const MAKE_TEXT: &str = "MakeText";
pub const TYPE_NAME: &str = "TypeName";
pub const MODEL_TEXT: &str = "ModelText";
pub const ATTRIBUTE_NAMES: &str = "Attribute Names";
pub const ATTRIBUTE_VALUES: &str = "Attribute Values";

// Attribute names that become columns after reshaping
pub const CONSUMPTION_TOTAL_TEXT: &str = "ConsumptionTotalText";
pub const BODY_COLOR_TEXT: &str = "BodyColorText";
pub const BODY_TYPE_TEXT: &str = "BodyTypeText";
pub const CONDITION_TYPE_TEXT: &str = "ConditionTypeText";
pub const CITY: &str = "City";
pub const FIRST_REG_YEAR: &str = "FirstRegYear";
pub const FIRST_REG_MONTH: &str = "FirstRegMonth";

/// Original record position, emitted by the unstack strategy
pub const RECORD_INDEX: &str = "level_0";

// Derived from the consumption text
pub const MILEAGE: &str = "mileage";
pub const MILEAGE_UNIT: &str = "mileage_unit";

// Canonical business schema
pub const CAR_TYPE: &str = "carType";
pub const COLOR: &str = "color";
pub const CONDITION: &str = "condition";
pub const CITY_CANONICAL: &str = "city";
pub const MAKE: &str = "make";
pub const MANUFACTURE_YEAR: &str = "manufacture_year";
pub const MODEL: &str = "model";
pub const MODEL_VARIANT: &str = "model_variant";
pub const MANUFACTURE_MONTH: &str = "manufacture_month";

/// Delimiter separating mileage from its unit in the consumption text
pub const CONSUMPTION_DELIMITER: &str = "l/100";

/// Composite key identifying one vehicle
pub const KEY_COLUMNS: [&str; 3] = [MAKE_TEXT, TYPE_NAME, MODEL_TEXT];

/// Columns that receive value substitutions during normalization
pub const SUBSTITUTION_COLUMNS: [&str; 9] = [
    MODEL_TEXT,
    BODY_COLOR_TEXT,
    BODY_TYPE_TEXT,
    CONDITION_TYPE_TEXT,
    FIRST_REG_MONTH,
    FIRST_REG_YEAR,
    MILEAGE,
    CITY,
    MILEAGE_UNIT,
];

/// Attribute columns with no counterpart in the business schema
pub const OBSOLETE_COLUMNS: [&str; 13] = [
    "Ccm",
    "Co2EmissionText",
    "ConsumptionRatingText",
    "Doors",
    "DriveTypeText",
    "FuelTypeText",
    "Hp",
    "InteriorColorText",
    "Km",
    "Properties",
    "Seats",
    "TransmissionTypeText",
    CONSUMPTION_TOTAL_TEXT,
];

/// Supplier field to business column
pub const RENAMES: [(&str, &str); 9] = [
    (BODY_TYPE_TEXT, CAR_TYPE),
    (BODY_COLOR_TEXT, COLOR),
    (CONDITION_TYPE_TEXT, CONDITION),
    (CITY, CITY_CANONICAL),
    (MAKE_TEXT, MAKE),
    (FIRST_REG_YEAR, MANUFACTURE_YEAR),
    (MODEL_TEXT, MODEL_VARIANT),
    (TYPE_NAME, MODEL),
    (FIRST_REG_MONTH, MANUFACTURE_MONTH),
];

/// Leading column order of the integrated table
pub const CANONICAL_ORDER: [&str; 11] = [
    CAR_TYPE,
    COLOR,
    CONDITION,
    CITY_CANONICAL,
    MAKE,
    MANUFACTURE_YEAR,
    MILEAGE,
    MILEAGE_UNIT,
    MODEL,
    MODEL_VARIANT,
    MANUFACTURE_MONTH,
];

/// Columns coerced to numbers in the integrated table
pub const NUMERIC_COLUMNS: [&str; 3] = [MILEAGE, MANUFACTURE_YEAR, MANUFACTURE_MONTH];

/// Convert a list of static names into owned column names
pub fn owned(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| n.to_string()).collect()
}
