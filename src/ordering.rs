//! Ordering directive parsing and validation.
//!
//! The ordering field takes comma-separated tokens of the form
//! `[+|-]<field_name>`:
//!
//! ```text
//! ?order_by=-created_at
//! ?order_by=created_at,updated_at
//! ?order_by=+created_at,-name
//! ```
//!
//! Only attributes of the target model can be ordered on; related-entity
//! paths such as `owner__name` are rejected like any other unknown field.

use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

use crate::schema::{BeforeValidator, FieldSpec, FilterSchema};
use crate::validation::ValidationError;
use crate::value::split_comma_list;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

/// One `[+|-]<field_name>` ordering directive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderingToken {
    pub field: String,
    pub direction: Direction,
}

impl OrderingToken {
    /// Parse a token; `-` is descending, `+` or no marker ascending
    #[must_use]
    pub fn parse(token: &str) -> Self {
        let token = token.trim();
        let (field, direction) = match token.strip_prefix('-') {
            Some(field) => (field, Direction::Desc),
            None => (token.strip_prefix('+').unwrap_or(token), Direction::Asc),
        };
        Self {
            field: field.to_string(),
            direction,
        }
    }
}

impl fmt::Display for OrderingToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.direction {
            Direction::Asc => write!(f, "{}", self.field),
            Direction::Desc => write!(f, "-{}", self.field),
        }
    }
}

/// Run in order on every field before coercion; both only touch the ordering field
pub(crate) const ORDERING_VALIDATORS: [BeforeValidator; 2] = [
    BeforeValidator {
        name: "strip_order_by_values",
        apply: strip_ordering_values,
    },
    BeforeValidator {
        name: "validate_order_by",
        apply: validate_ordering_values,
    },
];

/// Field name a token refers to, without its direction marker
fn base_field_name(token: &str) -> &str {
    token.strip_prefix(['+', '-']).unwrap_or(token)
}

/// Trim every token and drop the empty ones. Null or empty input becomes null.
pub fn strip_ordering_values(
    schema: &FilterSchema,
    field: &FieldSpec,
    value: Value,
) -> Result<Value, ValidationError> {
    if !schema.is_ordering_field(field) {
        return Ok(value);
    }

    let tokens = match value {
        Value::Null => return Ok(Value::Null),
        Value::String(text) if text.is_empty() => return Ok(Value::Null),
        Value::String(text) => split_comma_list(&text),
        Value::Array(items) if items.is_empty() => return Ok(Value::Null),
        Value::Array(items) => items,
        // Left for type coercion to reject
        other => return Ok(other),
    };

    let stripped = tokens
        .into_iter()
        .filter_map(|token| match token {
            Value::String(text) => {
                let trimmed = text.trim();
                (!trimmed.is_empty()).then(|| Value::String(trimmed.to_string()))
            }
            other => Some(other),
        })
        .collect();
    Ok(Value::Array(stripped))
}

/// Reject tokens naming unknown model fields and fields referenced twice
pub fn validate_ordering_values(
    schema: &FilterSchema,
    field: &FieldSpec,
    value: Value,
) -> Result<Value, ValidationError> {
    if !schema.is_ordering_field(field) {
        return Ok(value);
    }
    if let Value::Array(tokens) = &value {
        check_tokens(schema, tokens)?;
    }
    Ok(value)
}

fn check_tokens(schema: &FilterSchema, tokens: &[Value]) -> Result<(), ValidationError> {
    let constants = schema.constants();
    let mut usages: BTreeMap<&str, Vec<&str>> = BTreeMap::new();

    for token in tokens.iter().filter_map(Value::as_str) {
        let field_name = base_field_name(token);
        if !constants.model.has_field(field_name) {
            return Err(ValidationError::unlocated(
                "value_error",
                format!("{token} is not a valid ordering field."),
            ));
        }
        usages.entry(field_name).or_default().push(token);
    }

    // BTreeMap iteration keeps the report sorted by field name
    let ambiguous: Vec<&str> = usages
        .values()
        .filter(|tokens| tokens.len() > 1)
        .flatten()
        .copied()
        .collect();
    if ambiguous.is_empty() {
        return Ok(());
    }

    Err(ValidationError::unlocated(
        "value_error",
        format!(
            "Field names can appear at most once for {}. The following was ambiguous: {}.",
            constants.ordering_field_name,
            ambiguous.join(", ")
        ),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FieldType, ModelDescriptor};
    use serde_json::json;
    use std::sync::Arc;

    fn schema() -> Arc<FilterSchema> {
        FilterSchema::builder(
            "EventFilter",
            ModelDescriptor::new("events", ["count", "created_at", "name"]),
        )
        .field(FieldSpec::optional("count", FieldType::Integer))
        .field(FieldSpec::optional("order_by", FieldType::list(FieldType::Text)))
        .build()
    }

    fn run(schema: &FilterSchema, value: Value) -> Result<Value, ValidationError> {
        let field = schema.field("order_by").unwrap();
        let stripped = strip_ordering_values(schema, field, value)?;
        validate_ordering_values(schema, field, stripped)
    }

    #[test]
    fn test_parse_token_directions() {
        assert_eq!(
            OrderingToken::parse("-created_at"),
            OrderingToken { field: "created_at".to_string(), direction: Direction::Desc }
        );
        assert_eq!(OrderingToken::parse("+name").direction, Direction::Asc);
        assert_eq!(OrderingToken::parse("name").direction, Direction::Asc);
        assert_eq!(OrderingToken::parse("-count").to_string(), "-count");
        assert_eq!(OrderingToken::parse("+count").to_string(), "count");
    }

    #[test]
    fn test_strip_trims_and_drops_empty_tokens() {
        let schema = schema();
        let result = run(&schema, json!([" name ", "", "  ", "-count"])).unwrap();
        assert_eq!(result, json!(["name", "-count"]));
    }

    #[test]
    fn test_strip_splits_query_string() {
        let schema = schema();
        let result = run(&schema, json!("-created_at, name,")).unwrap();
        assert_eq!(result, json!(["-created_at", "name"]));
    }

    #[test]
    fn test_null_and_empty_are_not_errors() {
        let schema = schema();
        assert_eq!(run(&schema, Value::Null).unwrap(), Value::Null);
        assert_eq!(run(&schema, json!([])).unwrap(), Value::Null);
        assert_eq!(run(&schema, json!("")).unwrap(), Value::Null);
    }

    #[test]
    fn test_unknown_field_rejected() {
        let schema = schema();
        let err = run(&schema, json!(["name", "-owner"])).unwrap_err();
        assert_eq!(err.kind, "value_error");
        assert_eq!(err.msg, "-owner is not a valid ordering field.");
    }

    #[test]
    fn test_duplicate_with_opposite_directions() {
        let schema = schema();
        let err = run(&schema, json!(["count", "-count"])).unwrap_err();
        assert_eq!(
            err.msg,
            "Field names can appear at most once for order_by. The following was ambiguous: count, -count."
        );
    }

    #[test]
    fn test_duplicates_sorted_by_field_name() {
        let schema = schema();
        let err = run(&schema, json!(["name", "-created_at", "+name", "created_at"])).unwrap_err();
        assert!(err.msg.ends_with("ambiguous: -created_at, created_at, name, +name."));
    }

    #[test]
    fn test_strip_then_validate_is_idempotent() {
        let schema = schema();
        let once = run(&schema, json!([" -created_at", "name "])).unwrap();
        let twice = run(&schema, once.clone()).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_other_fields_untouched() {
        let schema = schema();
        let field = schema.field("count").unwrap();
        let value = json!(" 5 ");
        assert_eq!(strip_ordering_values(&schema, field, value.clone()).unwrap(), value);
        assert_eq!(validate_ordering_values(&schema, field, value.clone()).unwrap(), value);
    }
}
