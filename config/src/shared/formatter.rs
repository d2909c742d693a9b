use serde::{Deserialize, Serialize};

use crate::shared::ValidationError;

/// How quoted values treat embedded quote and backslash characters.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum QuotePolicy {
    /// Doubles embedded `'` and escapes `\`, producing statements that parse.
    #[default]
    Escaped,
    /// Copies the value between quotes untouched.
    Verbatim,
}

/// Settings controlling how column values are rendered into statements.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct FormatterConfig {
    /// Escaping applied to quoted text and blob values.
    #[serde(default)]
    pub quote_policy: QuotePolicy,
    /// Literal emitted for null column values.
    #[serde(default = "default_null_literal")]
    pub null_literal: String,
}

impl FormatterConfig {
    /// Default literal for null values.
    pub const DEFAULT_NULL_LITERAL: &'static str = "NULL";

    /// Validates the formatter configuration.
    ///
    /// The null literal must be non-empty and must not look like a quoted string, otherwise nulls
    /// would be indistinguishable from empty text values.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let literal = self.null_literal.trim();
        if literal.is_empty() || literal.starts_with('\'') {
            return Err(ValidationError::InvalidFieldValue {
                field: "formatter.null_literal".to_string(),
                constraint: "must be a non-empty, unquoted literal".to_string(),
            });
        }

        Ok(())
    }
}

impl Default for FormatterConfig {
    fn default() -> Self {
        Self {
            quote_policy: QuotePolicy::default(),
            null_literal: default_null_literal(),
        }
    }
}

fn default_null_literal() -> String {
    FormatterConfig::DEFAULT_NULL_LITERAL.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = FormatterConfig::default();
        assert_eq!(config.quote_policy, QuotePolicy::Escaped);
        assert_eq!(config.null_literal, "NULL");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_quoted_null_literal_is_rejected() {
        let config = FormatterConfig {
            null_literal: "''".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_quote_policy_deserializes_snake_case() {
        let config: FormatterConfig =
            serde_json::from_str(r#"{"quote_policy": "verbatim"}"#).unwrap();
        assert_eq!(config.quote_policy, QuotePolicy::Verbatim);
        assert_eq!(config.null_literal, "NULL");
    }
}
