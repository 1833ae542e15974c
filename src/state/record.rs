//! Extracted records and typed field values

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Field name to value, in stable key order
pub type RecordFields = BTreeMap<String, FieldValue>;

/// One record extracted from one visited location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedRecord {
    /// 1-based number shown to consumers: `skip_offset + index + 1`
    pub item_number: u64,

    /// The location this record was extracted from
    pub location: String,

    pub fields: RecordFields,

    pub extracted_at: DateTime<Utc>,
}

/// A typed field value
///
/// Raw text pulled from a page is coerced by [`FieldValue::coerce`], which
/// tries the interpretations in a fixed order: JSON object or array, then
/// integer, then boolean, then plain text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Integer(i64),
    Boolean(bool),
    Text(String),
    Structured(serde_json::Value),
}

impl FieldValue {
    /// Coerces raw extracted text into the most specific value it parses as
    pub fn coerce(raw: &str) -> Self {
        let trimmed = raw.trim();

        if looks_structured(trimmed) {
            if let Ok(value) = serde_json::from_str::<serde_json::Value>(trimmed) {
                return Self::Structured(value);
            }
        }

        if is_integer_literal(trimmed) {
            if let Ok(n) = trimmed.parse::<i64>() {
                return Self::Integer(n);
            }
        }

        if trimmed.eq_ignore_ascii_case("true") {
            return Self::Boolean(true);
        }
        if trimmed.eq_ignore_ascii_case("false") {
            return Self::Boolean(false);
        }

        Self::Text(trimmed.to_string())
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(n) => write!(f, "{}", n),
            Self::Boolean(b) => write!(f, "{}", b),
            Self::Text(s) => write!(f, "{}", s),
            Self::Structured(v) => write!(f, "{}", v),
        }
    }
}

fn looks_structured(s: &str) -> bool {
    (s.starts_with('{') && s.ends_with('}')) || (s.starts_with('[') && s.ends_with(']'))
}

fn is_integer_literal(s: &str) -> bool {
    let digits = s.strip_prefix('-').unwrap_or(s);
    !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_coerce_structured_first() {
        assert_eq!(
            FieldValue::coerce(r#"{"size": "M"}"#),
            FieldValue::Structured(json!({"size": "M"}))
        );
        assert_eq!(
            FieldValue::coerce("[1, 2]"),
            FieldValue::Structured(json!([1, 2]))
        );
    }

    #[test]
    fn test_coerce_broken_json_is_text() {
        assert_eq!(
            FieldValue::coerce("[not json]"),
            FieldValue::Text("[not json]".to_string())
        );
    }

    #[test]
    fn test_coerce_integer() {
        assert_eq!(FieldValue::coerce("42"), FieldValue::Integer(42));
        assert_eq!(FieldValue::coerce(" -7 "), FieldValue::Integer(-7));
        assert_eq!(
            FieldValue::coerce("1.5"),
            FieldValue::Text("1.5".to_string())
        );
        assert_eq!(FieldValue::coerce("-"), FieldValue::Text("-".to_string()));
    }

    #[test]
    fn test_coerce_integer_overflow_is_text() {
        let raw = "99999999999999999999999";
        assert_eq!(FieldValue::coerce(raw), FieldValue::Text(raw.to_string()));
    }

    #[test]
    fn test_coerce_boolean() {
        assert_eq!(FieldValue::coerce("true"), FieldValue::Boolean(true));
        assert_eq!(FieldValue::coerce("FALSE"), FieldValue::Boolean(false));
        assert_eq!(
            FieldValue::coerce("yes"),
            FieldValue::Text("yes".to_string())
        );
    }

    #[test]
    fn test_coerce_text_is_trimmed() {
        assert_eq!(
            FieldValue::coerce("  Blue Kettle \n"),
            FieldValue::Text("Blue Kettle".to_string())
        );
    }

    #[test]
    fn test_untagged_serialization() {
        let mut fields = RecordFields::new();
        fields.insert("stock".to_string(), FieldValue::Integer(3));
        fields.insert("inStock".to_string(), FieldValue::Boolean(true));
        fields.insert("name".to_string(), FieldValue::Text("Kettle".to_string()));

        let value = serde_json::to_value(&fields).unwrap();
        assert_eq!(value, json!({"stock": 3, "inStock": true, "name": "Kettle"}));

        let parsed: RecordFields = serde_json::from_value(value).unwrap();
        assert_eq!(parsed, fields);
    }
}
