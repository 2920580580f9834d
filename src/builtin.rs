//! Default strategy set for the common column types.
//!
//! These are sample implementations of the extension contract, mirroring the
//! dtype claims of the historical producer. Text, boolean, and date derive
//! nothing beyond the base attributes; number derives the front-end `step`
//! increment from the dtype, and category publishes the column's distinct
//! values as `options`.

use serde_json::{Value as JsonValue, json};

use crate::{
    column::Column,
    error::Result,
    field::FieldKind,
    strategy::{Attributes, Strategy},
};

pub fn text_strategy() -> Result<Strategy> {
    Strategy::new("text", FieldKind::Text, ["object", "string"])
}

pub fn boolean_strategy() -> Result<Strategy> {
    Strategy::new("boolean", FieldKind::Boolean, ["bool", "boolean"])
}

pub fn date_strategy() -> Result<Strategy> {
    Strategy::new("date", FieldKind::Date, ["datetime64[ns]", "datetime64"])
}

/// Numeric columns get a default `step`: 0.1 for float dtypes, 1 for
/// integral ones.
pub fn number_strategy() -> Result<Strategy> {
    Strategy::with_derive(
        "number",
        FieldKind::Number,
        ["int64", "float64", "int32", "float32"],
        |column: &dyn Column| {
            let step = if is_float_dtype(&column.dtype().canonical()) {
                json!(0.1)
            } else {
                json!(1.0)
            };
            let mut attrs = Attributes::new();
            attrs.insert("step".to_string(), step);
            Ok(attrs)
        },
    )
}

/// Categorical columns publish their distinct values as the field's options.
pub fn category_strategy() -> Result<Strategy> {
    Strategy::with_derive(
        "category",
        FieldKind::Category,
        ["category"],
        |column: &dyn Column| {
            let mut attrs = Attributes::new();
            attrs.insert(
                "options".to_string(),
                JsonValue::Array(column.distinct_values()),
            );
            Ok(attrs)
        },
    )
}

/// All five built-in strategies, ready for `register_all`.
pub fn default_strategies() -> Result<Vec<Strategy>> {
    Ok(vec![
        text_strategy()?,
        number_strategy()?,
        boolean_strategy()?,
        date_strategy()?,
        category_strategy()?,
    ])
}

fn is_float_dtype(canonical: &str) -> bool {
    matches!(canonical, "float" | "float32" | "float64")
}
