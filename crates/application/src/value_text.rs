//! Loose value semantics shared by both engines.
//!
//! Form values and table rows are untyped JSON, so comparisons, text
//! conversion and numeric coercion follow one set of rules here.

use std::cmp::Ordering;

use serde_json::{Number, Value};

/// Returns whether a value counts as "no value" for validation.
pub(crate) fn is_empty_value(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(text)) => text.trim().is_empty(),
        Some(Value::Array(items)) => items.is_empty(),
        Some(_) => false,
    }
}

/// Loose truthiness: missing, null, `false`, zero, `NaN` and `""` are false.
pub(crate) fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(flag)) => *flag,
        Some(Value::Number(number)) => number.as_f64().is_some_and(|number| number != 0.0),
        Some(Value::String(text)) => !text.is_empty(),
        Some(Value::Array(_) | Value::Object(_)) => true,
    }
}

/// Strict equality. A missing value equals nothing and numbers compare by magnitude.
pub(crate) fn strict_equals(left: Option<&Value>, right: &Value) -> bool {
    match (left, right) {
        (None, _) => false,
        (Some(Value::Number(left)), Value::Number(right)) => left.as_f64() == right.as_f64(),
        (Some(left), right) => left == right,
    }
}

/// Numeric coercion. `NaN` means the value has no numeric reading.
pub(crate) fn to_number(value: Option<&Value>) -> f64 {
    match value {
        None => f64::NAN,
        Some(Value::Null) => 0.0,
        Some(Value::Bool(flag)) => f64::from(u8::from(*flag)),
        Some(Value::Number(number)) => number.as_f64().unwrap_or(f64::NAN),
        Some(Value::String(text)) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                0.0
            } else {
                trimmed.parse::<f64>().unwrap_or(f64::NAN)
            }
        }
        Some(Value::Array(items)) if items.is_empty() => 0.0,
        Some(Value::Array(_) | Value::Object(_)) => f64::NAN,
    }
}

/// Text form used for search, text filters, badge lookup and CSV cells.
///
/// Missing and null values read as the empty string.
pub(crate) fn display_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::Bool(flag)) => flag.to_string(),
        Some(Value::Number(number)) => number_text(number),
        Some(Value::String(text)) => text.clone(),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| display_text(Some(item)))
            .collect::<Vec<_>>()
            .join(","),
        Some(Value::Object(_)) => "[object Object]".to_owned(),
    }
}

fn number_text(number: &Number) -> String {
    match number.as_f64() {
        Some(float)
            if number.is_f64() && float.fract() == 0.0 && float.abs() < 1e15 =>
        {
            format!("{float:.0}")
        }
        _ => number.to_string(),
    }
}

fn type_rank(value: Option<&Value>) -> u8 {
    match value {
        None | Some(Value::Null) => 0,
        Some(Value::Bool(_)) => 1,
        Some(Value::Number(_)) => 2,
        Some(Value::String(_)) => 3,
        Some(Value::Array(_)) => 4,
        Some(Value::Object(_)) => 5,
    }
}

/// Total order used for sorting raw cell values.
///
/// Values of different kinds order as missing, boolean, number, string, array, object.
pub(crate) fn compare_values(left: Option<&Value>, right: Option<&Value>) -> Ordering {
    match (left, right) {
        (Some(Value::Bool(left)), Some(Value::Bool(right))) => left.cmp(right),
        (Some(Value::Number(left)), Some(Value::Number(right))) => left
            .as_f64()
            .unwrap_or_default()
            .total_cmp(&right.as_f64().unwrap_or_default()),
        (Some(Value::String(left)), Some(Value::String(right))) => left.cmp(right),
        _ => type_rank(left)
            .cmp(&type_rank(right))
            .then_with(|| display_text(left).cmp(&display_text(right))),
    }
}
