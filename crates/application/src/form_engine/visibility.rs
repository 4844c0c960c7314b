use std::collections::HashMap;

use januscope_domain::{
    FieldDefinition, FormSchema, FormValues, VisibilityCondition, VisibilityOperator,
};
use serde_json::Value;

use crate::value_text::strict_equals;

/// Memoized visibility of every schema field for one value map.
pub type VisibilityMap = HashMap<String, bool>;

/// Returns whether a field is shown for the given values.
///
/// Fields without conditions are always visible; several conditions must all hold.
#[must_use]
pub fn is_visible(field: &FieldDefinition, values: &FormValues) -> bool {
    field
        .visibility_conditions()
        .iter()
        .all(|condition| condition_holds(condition, values))
}

/// Evaluates visibility once per field.
#[must_use]
pub fn visibility_map(schema: &FormSchema, values: &FormValues) -> VisibilityMap {
    schema
        .fields()
        .iter()
        .map(|field| (field.id().as_str().to_owned(), is_visible(field, values)))
        .collect()
}

fn condition_holds(condition: &VisibilityCondition, values: &FormValues) -> bool {
    let current = values.get(condition.field().as_str());

    match condition.op() {
        VisibilityOperator::Equals => strict_equals(current, condition.value()),
        VisibilityOperator::NotEquals => !strict_equals(current, condition.value()),
        VisibilityOperator::In => match condition.value() {
            Value::Array(candidates) => contains(candidates, current),
            _ => false,
        },
        VisibilityOperator::NotIn => match condition.value() {
            Value::Array(candidates) => !contains(candidates, current),
            _ => true,
        },
    }
}

fn contains(candidates: &[Value], current: Option<&Value>) -> bool {
    candidates
        .iter()
        .any(|candidate| strict_equals(current, candidate))
}
