//! Typed filter values and scalar coercion.
//!
//! Raw input arrives as `serde_json::Value`: query strings produce strings,
//! dumped filters produce numbers, arrays and objects. Coercion is lax in the
//! way query strings need it to be, so `"5"` is a valid integer and
//! `"red,blue"` is a valid list.

use serde_json::{Number, Value};
use std::fmt;
use uuid::Uuid;

use crate::filter::Filter;
use crate::validation::ValidationError;

/// A validated field value
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Uuid(Uuid),
    List(Vec<FilterValue>),
    /// A reconstructed nested filter
    Nested(Box<Filter>),
}

impl FilterValue {
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(value) => Some(*value),
            _ => None,
        }
    }

    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(value) => Some(*value),
            Self::Int(value) => Some(*value as f64),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(value) => Some(value),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_list(&self) -> Option<&[FilterValue]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_filter(&self) -> Option<&Filter> {
        match self {
            Self::Nested(filter) => Some(filter),
            _ => None,
        }
    }

    /// Convert back to raw JSON, the inverse of coercion.
    ///
    /// Nested filters are dumped as mappings using the same `by_alias` and
    /// `exclude_unset` policy.
    #[must_use]
    pub fn to_json(&self, by_alias: bool, exclude_unset: bool) -> Value {
        match self {
            Self::Null => Value::Null,
            Self::Bool(value) => Value::Bool(*value),
            Self::Int(value) => Value::Number((*value).into()),
            // JSON has no non-finite numbers; `coerce_float` parses the string form back
            Self::Float(value) => Number::from_f64(*value)
                .map_or_else(|| Value::String(value.to_string()), Value::Number),
            Self::Text(value) => Value::String(value.clone()),
            Self::Uuid(value) => Value::String(value.to_string()),
            Self::List(items) => Value::Array(
                items
                    .iter()
                    .map(|item| item.to_json(by_alias, exclude_unset))
                    .collect(),
            ),
            Self::Nested(filter) => Value::Object(filter.to_mapping(by_alias, exclude_unset)),
        }
    }
}

/// Lists render comma-joined, the form they take in a query string
impl fmt::Display for FilterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Bool(value) => write!(f, "{value}"),
            Self::Int(value) => write!(f, "{value}"),
            Self::Float(value) => write!(f, "{value}"),
            Self::Text(value) => write!(f, "{value}"),
            Self::Uuid(value) => write!(f, "{value}"),
            Self::List(items) => {
                let joined = items
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(",");
                write!(f, "{joined}")
            }
            Self::Nested(filter) => write!(f, "{}", filter.schema().name()),
        }
    }
}

impl From<bool> for FilterValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i32> for FilterValue {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<i64> for FilterValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for FilterValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Uuid> for FilterValue {
    fn from(value: Uuid) -> Self {
        Self::Uuid(value)
    }
}

impl<T: Into<FilterValue>> From<Vec<T>> for FilterValue {
    fn from(values: Vec<T>) -> Self {
        Self::List(values.into_iter().map(Into::into).collect())
    }
}

impl From<Filter> for FilterValue {
    fn from(filter: Filter) -> Self {
        Self::Nested(Box::new(filter))
    }
}

/// Name of a raw value's JSON type, used in error messages
pub(crate) const fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

pub(crate) fn coerce_bool(raw: &Value) -> Result<FilterValue, ValidationError> {
    let parsed = match raw {
        Value::Bool(value) => Some(*value),
        Value::Number(number) => match number.as_i64() {
            Some(0) => Some(false),
            Some(1) => Some(true),
            _ => None,
        },
        Value::String(text) => match text.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" | "t" | "y" => Some(true),
            "false" | "0" | "no" | "off" | "f" | "n" => Some(false),
            _ => None,
        },
        _ => None,
    };
    parsed.map(FilterValue::Bool).ok_or_else(|| {
        ValidationError::unlocated(
            "bool_parsing",
            "Input should be a valid boolean, unable to interpret input",
        )
    })
}

#[allow(clippy::cast_possible_truncation)]
pub(crate) fn coerce_integer(raw: &Value) -> Result<FilterValue, ValidationError> {
    let parsing_error = || {
        ValidationError::unlocated(
            "int_parsing",
            "Input should be a valid integer, unable to parse string as an integer",
        )
    };
    match raw {
        Value::Number(number) => number
            .as_i64()
            .or_else(|| {
                number
                    .as_f64()
                    .filter(|value| value.fract() == 0.0)
                    .map(|value| value as i64)
            })
            .map(FilterValue::Int)
            .ok_or_else(|| {
                ValidationError::unlocated(
                    "int_from_float",
                    "Input should be a valid integer, got a number with a fractional part",
                )
            }),
        Value::String(text) => text
            .trim()
            .parse::<i64>()
            .map(FilterValue::Int)
            .map_err(|_| parsing_error()),
        _ => Err(ValidationError::unlocated(
            "int_type",
            "Input should be a valid integer",
        )),
    }
}

pub(crate) fn coerce_float(raw: &Value) -> Result<FilterValue, ValidationError> {
    match raw {
        Value::Number(number) => number.as_f64().map(FilterValue::Float).ok_or_else(|| {
            ValidationError::unlocated("float_type", "Input should be a valid number")
        }),
        Value::String(text) => text.trim().parse::<f64>().map(FilterValue::Float).map_err(|_| {
            ValidationError::unlocated(
                "float_parsing",
                "Input should be a valid number, unable to parse string as a number",
            )
        }),
        _ => Err(ValidationError::unlocated(
            "float_type",
            "Input should be a valid number",
        )),
    }
}

pub(crate) fn coerce_text(raw: &Value) -> Result<FilterValue, ValidationError> {
    match raw {
        Value::String(text) => Ok(FilterValue::Text(text.clone())),
        _ => Err(ValidationError::unlocated(
            "string_type",
            "Input should be a valid string",
        )),
    }
}

pub(crate) fn coerce_uuid(raw: &Value) -> Result<FilterValue, ValidationError> {
    match raw {
        Value::String(text) => Uuid::parse_str(text.trim())
            .map(FilterValue::Uuid)
            .map_err(|err| {
                ValidationError::unlocated(
                    "uuid_parsing",
                    format!("Input should be a valid UUID, {err}"),
                )
            }),
        _ => Err(ValidationError::unlocated(
            "uuid_type",
            "UUID input should be a string",
        )),
    }
}

/// Split the comma-separated form of a list; an empty string is an empty list
pub(crate) fn split_comma_list(text: &str) -> Vec<Value> {
    if text.is_empty() {
        return Vec::new();
    }
    text.split(',')
        .map(|item| Value::String(item.to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_coerce_integer_from_query_string() {
        assert_eq!(coerce_integer(&json!("5")).unwrap(), FilterValue::Int(5));
        assert_eq!(coerce_integer(&json!(" 12 ")).unwrap(), FilterValue::Int(12));
        assert_eq!(coerce_integer(&json!(7.0)).unwrap(), FilterValue::Int(7));
    }

    #[test]
    fn test_coerce_integer_errors() {
        assert_eq!(coerce_integer(&json!("five")).unwrap_err().kind, "int_parsing");
        assert_eq!(coerce_integer(&json!(7.5)).unwrap_err().kind, "int_from_float");
        assert_eq!(coerce_integer(&json!(true)).unwrap_err().kind, "int_type");
    }

    #[test]
    fn test_coerce_bool_variants() {
        for truthy in ["true", "True", "1", "yes", "on"] {
            assert_eq!(coerce_bool(&json!(truthy)).unwrap(), FilterValue::Bool(true));
        }
        for falsy in ["false", "0", "no", "off"] {
            assert_eq!(coerce_bool(&json!(falsy)).unwrap(), FilterValue::Bool(false));
        }
        assert!(coerce_bool(&json!("maybe")).is_err());
    }

    #[test]
    fn test_coerce_text_rejects_numbers() {
        assert_eq!(coerce_text(&json!("abc")).unwrap(), FilterValue::from("abc"));
        assert_eq!(coerce_text(&json!(1)).unwrap_err().kind, "string_type");
    }

    #[test]
    fn test_coerce_uuid() {
        let id = "550e8400-e29b-41d4-a716-446655440000";
        assert_eq!(
            coerce_uuid(&json!(id)).unwrap(),
            FilterValue::Uuid(Uuid::parse_str(id).unwrap())
        );
        assert_eq!(coerce_uuid(&json!("nope")).unwrap_err().kind, "uuid_parsing");
    }

    #[test]
    fn test_split_comma_list() {
        assert_eq!(split_comma_list("a,b"), vec![json!("a"), json!("b")]);
        assert!(split_comma_list("").is_empty());
    }

    #[test]
    fn test_non_finite_floats_survive_dumping() {
        for raw in ["inf", "-inf", "NaN"] {
            let value = coerce_float(&json!(raw)).unwrap();
            let dumped = value.to_json(false, false);
            assert_eq!(dumped, json!(raw));
            let reparsed = coerce_float(&dumped).unwrap().as_f64().unwrap();
            let original = value.as_f64().unwrap();
            assert!(reparsed == original || (reparsed.is_nan() && original.is_nan()));
        }
        assert_eq!(FilterValue::Float(1.5).to_json(false, false), json!(1.5));
    }

    #[test]
    fn test_list_display_is_comma_joined() {
        let value = FilterValue::from(vec!["red", "blue"]);
        assert_eq!(value.to_string(), "red,blue");
        assert_eq!(value.to_json(false, false), json!(["red", "blue"]));
    }
}
