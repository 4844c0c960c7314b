use std::sync::Arc;

use januscope_core::{AppError, AppResult};
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;

use crate::FormValues;
use crate::callback::Callback;

/// Signature of a custom field validator: `(value, all form values)`.
pub type CustomValidateFn = dyn Fn(&Value, &FormValues) -> CustomValidation + Send + Sync;

/// Result of a custom validator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CustomValidation {
    /// The value is acceptable.
    Valid,
    /// The value is rejected without a specific message.
    Invalid,
    /// The value is rejected with this message.
    Message(String),
}

impl From<bool> for CustomValidation {
    fn from(value: bool) -> Self {
        if value { Self::Valid } else { Self::Invalid }
    }
}

impl From<String> for CustomValidation {
    fn from(value: String) -> Self {
        Self::Message(value)
    }
}

impl From<&str> for CustomValidation {
    fn from(value: &str) -> Self {
        Self::Message(value.to_owned())
    }
}

/// Length constraint with its failure message.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LengthRule {
    /// Length bound (characters for strings, items for arrays).
    pub value: usize,
    /// Message surfaced when the bound is violated.
    pub message: String,
}

/// Numeric bound with its failure message.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BoundRule {
    /// Inclusive numeric bound.
    pub value: f64,
    /// Message surfaced when the bound is violated.
    pub message: String,
}

#[derive(Deserialize)]
struct PatternRuleDocument {
    value: String,
    message: String,
}

/// Regular expression constraint for string values.
#[derive(Debug, Clone, Deserialize)]
#[serde(try_from = "PatternRuleDocument")]
pub struct PatternRule {
    regex: Regex,
    message: String,
}

impl PatternRule {
    /// Compiles a validated pattern rule.
    pub fn new(pattern: &str, message: impl Into<String>) -> AppResult<Self> {
        let regex = Regex::new(pattern).map_err(|error| {
            AppError::Validation(format!("invalid validation pattern '{pattern}': {error}"))
        })?;

        Ok(Self {
            regex,
            message: message.into(),
        })
    }

    /// Returns whether the text matches the pattern.
    #[must_use]
    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }

    /// Returns the pattern source.
    #[must_use]
    pub fn source(&self) -> &str {
        self.regex.as_str()
    }

    /// Returns the failure message.
    #[must_use]
    pub fn message(&self) -> &str {
        self.message.as_str()
    }
}

impl PartialEq for PatternRule {
    fn eq(&self, other: &Self) -> bool {
        self.source() == other.source() && self.message == other.message
    }
}

impl TryFrom<PatternRuleDocument> for PatternRule {
    type Error = AppError;

    fn try_from(document: PatternRuleDocument) -> Result<Self, Self::Error> {
        Self::new(document.value.as_str(), document.message)
    }
}

/// Declarative validation constraints of one form field.
///
/// Built-in checks run in a fixed order: required, then string length and
/// pattern, numeric bounds or array minimum length, then the custom validator.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ValidationRules {
    required: Option<String>,
    min_length: Option<LengthRule>,
    max_length: Option<LengthRule>,
    min: Option<BoundRule>,
    max: Option<BoundRule>,
    pattern: Option<PatternRule>,
    #[serde(skip)]
    validate: Option<Callback<CustomValidateFn>>,
}

impl ValidationRules {
    /// Marks the field as required with the given message.
    #[must_use]
    pub fn required(mut self, message: impl Into<String>) -> Self {
        self.required = Some(message.into());
        self
    }

    /// Sets the minimum length constraint.
    #[must_use]
    pub fn min_length(mut self, value: usize, message: impl Into<String>) -> Self {
        self.min_length = Some(LengthRule {
            value,
            message: message.into(),
        });
        self
    }

    /// Sets the maximum string length constraint.
    #[must_use]
    pub fn max_length(mut self, value: usize, message: impl Into<String>) -> Self {
        self.max_length = Some(LengthRule {
            value,
            message: message.into(),
        });
        self
    }

    /// Sets the numeric lower bound.
    #[must_use]
    pub fn min(mut self, value: f64, message: impl Into<String>) -> Self {
        self.min = Some(BoundRule {
            value,
            message: message.into(),
        });
        self
    }

    /// Sets the numeric upper bound.
    #[must_use]
    pub fn max(mut self, value: f64, message: impl Into<String>) -> Self {
        self.max = Some(BoundRule {
            value,
            message: message.into(),
        });
        self
    }

    /// Sets the regular expression constraint.
    pub fn pattern(mut self, pattern: &str, message: impl Into<String>) -> AppResult<Self> {
        self.pattern = Some(PatternRule::new(pattern, message)?);
        Ok(self)
    }

    /// Sets the custom validator, evaluated after every built-in check passed.
    #[must_use]
    pub fn validate<F>(mut self, validator: F) -> Self
    where
        F: Fn(&Value, &FormValues) -> CustomValidation + Send + Sync + 'static,
    {
        let validator: Arc<CustomValidateFn> = Arc::new(validator);
        self.validate = Some(Callback::new(validator));
        self
    }

    /// Returns the required message, when the field is required.
    #[must_use]
    pub fn required_message(&self) -> Option<&str> {
        self.required.as_deref()
    }

    /// Returns the minimum length rule.
    #[must_use]
    pub fn min_length_rule(&self) -> Option<&LengthRule> {
        self.min_length.as_ref()
    }

    /// Returns the maximum length rule.
    #[must_use]
    pub fn max_length_rule(&self) -> Option<&LengthRule> {
        self.max_length.as_ref()
    }

    /// Returns the numeric lower bound rule.
    #[must_use]
    pub fn min_rule(&self) -> Option<&BoundRule> {
        self.min.as_ref()
    }

    /// Returns the numeric upper bound rule.
    #[must_use]
    pub fn max_rule(&self) -> Option<&BoundRule> {
        self.max.as_ref()
    }

    /// Returns the pattern rule.
    #[must_use]
    pub fn pattern_rule(&self) -> Option<&PatternRule> {
        self.pattern.as_ref()
    }

    /// Returns the custom validator.
    #[must_use]
    pub fn custom_validator(&self) -> Option<&CustomValidateFn> {
        self.validate.as_ref().map(Callback::get)
    }
}

#[cfg(test)]
mod tests {
    use super::{CustomValidation, PatternRule, ValidationRules};

    #[test]
    fn pattern_rule_rejects_invalid_regex() {
        assert!(PatternRule::new("([a-z", "broken").is_err());
    }

    #[test]
    fn rules_deserialize_from_document() {
        let rules: ValidationRules = serde_json::from_value(serde_json::json!({
            "required": "Name is required",
            "min_length": { "value": 3, "message": "Too short" },
            "pattern": { "value": "^https?://.+", "message": "Bad URL" }
        }))
        .unwrap_or_else(|_| unreachable!());

        assert_eq!(rules.required_message(), Some("Name is required"));
        assert_eq!(rules.min_length_rule().map(|rule| rule.value), Some(3));
        assert!(
            rules
                .pattern_rule()
                .is_some_and(|rule| rule.is_match("https://example.com"))
        );
        assert!(rules.custom_validator().is_none());
    }

    #[test]
    fn custom_validation_converts_from_bool_and_text() {
        assert_eq!(CustomValidation::from(true), CustomValidation::Valid);
        assert_eq!(CustomValidation::from(false), CustomValidation::Invalid);
        assert_eq!(
            CustomValidation::from("taken"),
            CustomValidation::Message("taken".to_owned())
        );
    }
}
