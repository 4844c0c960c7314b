use januscope_domain::{CustomValidation, FieldDefinition, FormErrors, FormSchema, FormValues};
use serde_json::Value;

use super::visibility::{VisibilityMap, visibility_map};
use crate::value_text::is_empty_value;

const INVALID_MESSAGE: &str = "Invalid";

/// Validates one field value and returns the first failing rule's message.
#[must_use]
pub fn validate_field(
    field: &FieldDefinition,
    value: Option<&Value>,
    values: &FormValues,
) -> Option<String> {
    let rules = field.rules()?;

    if is_empty_value(value) {
        return rules.required_message().map(str::to_owned);
    }
    let value = value?;

    let built_in = match value {
        Value::String(text) => {
            let length = text.chars().count();
            if let Some(rule) = rules.min_length_rule().filter(|rule| length < rule.value) {
                Some(rule.message.as_str())
            } else if let Some(rule) = rules.max_length_rule().filter(|rule| length > rule.value) {
                Some(rule.message.as_str())
            } else {
                rules
                    .pattern_rule()
                    .filter(|rule| !rule.is_match(text))
                    .map(|rule| rule.message())
            }
        }
        Value::Number(number) => {
            let number = number.as_f64().unwrap_or_default();
            if let Some(rule) = rules.min_rule().filter(|rule| number < rule.value) {
                Some(rule.message.as_str())
            } else {
                rules
                    .max_rule()
                    .filter(|rule| number > rule.value)
                    .map(|rule| rule.message.as_str())
            }
        }
        Value::Array(items) => rules
            .min_length_rule()
            .filter(|rule| items.len() < rule.value)
            .map(|rule| rule.message.as_str()),
        _ => None,
    };
    if let Some(message) = built_in {
        return Some(message.to_owned());
    }

    let validator = rules.custom_validator()?;
    match validator(value, values) {
        CustomValidation::Valid => None,
        CustomValidation::Invalid => Some(INVALID_MESSAGE.to_owned()),
        CustomValidation::Message(message) => Some(message),
    }
}

/// Validates every visible field and returns the failures keyed by field id.
#[must_use]
pub fn validate_form(schema: &FormSchema, values: &FormValues) -> FormErrors {
    validate_visible(schema, values, &visibility_map(schema, values))
}

pub(super) fn validate_visible(
    schema: &FormSchema,
    values: &FormValues,
    visibility: &VisibilityMap,
) -> FormErrors {
    schema
        .fields()
        .iter()
        .filter(|field| {
            visibility
                .get(field.id().as_str())
                .copied()
                .unwrap_or(true)
        })
        .filter_map(|field| {
            let field_id = field.id().as_str();
            validate_field(field, values.get(field_id), values)
                .map(|message| (field_id.to_owned(), message))
        })
        .collect()
}
