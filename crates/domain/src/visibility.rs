use januscope_core::{AppResult, NonEmptyString};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Comparison operators for visibility conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisibilityOperator {
    /// Referenced value equals the literal.
    Equals,
    /// Referenced value differs from the literal.
    NotEquals,
    /// Referenced value is a member of the literal list.
    In,
    /// Referenced value is not a member of the literal list.
    NotIn,
}

/// Predicate on another field's current value.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct VisibilityCondition {
    field: NonEmptyString,
    op: VisibilityOperator,
    #[serde(default)]
    value: Value,
}

impl VisibilityCondition {
    /// Creates a validated visibility condition.
    pub fn new(field: impl Into<String>, op: VisibilityOperator, value: Value) -> AppResult<Self> {
        Ok(Self {
            field: NonEmptyString::new(field)?,
            op,
            value,
        })
    }

    /// Returns the referenced field id.
    #[must_use]
    pub fn field(&self) -> &NonEmptyString {
        &self.field
    }

    /// Returns the comparison operator.
    #[must_use]
    pub fn op(&self) -> VisibilityOperator {
        self.op
    }

    /// Returns the literal compared against.
    #[must_use]
    pub fn value(&self) -> &Value {
        &self.value
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(VisibilityCondition),
    Many(Vec<VisibilityCondition>),
}

/// Accepts either a single condition object or a list of conditions.
pub(crate) fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<VisibilityCondition>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(condition) => vec![condition],
        OneOrMany::Many(conditions) => conditions,
    })
}
