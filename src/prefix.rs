//! Nested filter composition.
//!
//! [`with_prefix`] turns a filter schema into one whose fields are bound as
//! `<prefix>__<field>`, so it can sit inside another filter without its
//! query parameters colliding with the outer ones. The returned
//! [`NestedFilter`] is the field type the outer schema declares; it rebuilds
//! instances of the *original* schema, so the outer filter always works with
//! the unprefixed field names.
//!
//! ```rust
//! use filtercrate::prefix::with_prefix;
//! use filtercrate::schema::{FieldSpec, FieldType, FilterSchema, ModelDescriptor};
//! use serde_json::json;
//!
//! let number = FilterSchema::builder("NumberFilter", ModelDescriptor::new("numbers", ["count"]))
//!     .field(FieldSpec::optional("count", FieldType::Integer))
//!     .build();
//! let (prefixed, nested) = with_prefix("number_filter", &number);
//!
//! assert_eq!(prefixed.external_name(&prefixed.fields()[0]), "number_filter__count");
//! let filter = nested.reconstruct(&json!({"number_filter__count": "5"})).unwrap();
//! assert_eq!(filter.get("count").and_then(|value| value.as_i64()), Some(5));
//! ```

use serde_json::{Map, Value};
use std::sync::Arc;

use crate::filter::Filter;
use crate::schema::{FieldType, FilterSchema};
use crate::validation::{ValidationError, ValidationErrors};
use crate::value::json_type_name;

/// Produce the prefixed variant of `schema` and the nested field type that
/// reconstructs it.
///
/// The prefixed schema keeps every field, constant and validator of the
/// original. Fields with an explicit alias keep binding from that alias.
#[must_use]
pub fn with_prefix(prefix: &str, schema: &Arc<FilterSchema>) -> (Arc<FilterSchema>, NestedFilter) {
    let mut constants = schema.constants().clone();
    constants.prefix = Some(prefix.to_string());
    let prefixed = schema.derive(
        schema.fields().to_vec(),
        constants,
        schema.before_validators().to_vec(),
    );

    let nested = NestedFilter {
        prefix: prefix.to_string(),
        original: Arc::clone(schema),
    };
    (Arc::new(prefixed), nested)
}

/// Field type of a prefixed filter embedded in an outer schema
#[derive(Debug, Clone)]
pub struct NestedFilter {
    prefix: String,
    original: Arc<FilterSchema>,
}

impl PartialEq for NestedFilter {
    fn eq(&self, other: &Self) -> bool {
        self.prefix == other.prefix && Arc::ptr_eq(&self.original, &other.original)
    }
}

impl NestedFilter {
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// The unprefixed schema instances are rebuilt into
    #[must_use]
    pub const fn original(&self) -> &Arc<FilterSchema> {
        &self.original
    }

    /// Whether `key` is a query parameter of the prefixed schema.
    ///
    /// That is any `<prefix>__` key, plus the alias of every aliased field,
    /// since aliases are bound unprefixed.
    #[must_use]
    pub fn binds_parameter(&self, key: &str) -> bool {
        key.starts_with(&format!("{}__", self.prefix))
            || self
                .original
                .fields()
                .iter()
                .any(|field| field.alias() == Some(key))
    }

    /// Rebuild an instance of the original schema from a raw mapping.
    ///
    /// Keys starting with `<prefix>__` lose that marker; other keys pass
    /// through unchanged. Anything but a mapping is rejected.
    ///
    /// # Errors
    ///
    /// Returns a `value_error` for non-mapping input, otherwise the original
    /// schema's validation errors.
    pub fn reconstruct(&self, value: &Value) -> Result<Filter, ValidationErrors> {
        match value {
            Value::Object(mapping) => self.reconstruct_mapping(mapping),
            other => Err(ValidationError::unlocated(
                "value_error",
                format!("Unexpected type: {}", json_type_name(other)),
            )
            .into()),
        }
    }

    /// Rebuild an instance of the original schema from an already-built
    /// filter, such as an instance of the prefixed schema.
    ///
    /// Only fields explicitly set on `record` are carried over.
    ///
    /// # Errors
    ///
    /// Returns the original schema's validation errors for the carried-over
    /// values.
    pub fn reconstruct_record(&self, record: &Filter) -> Result<Filter, ValidationErrors> {
        self.reconstruct_mapping(&record.to_mapping(false, true))
    }

    fn reconstruct_mapping(
        &self,
        mapping: &Map<String, Value>,
    ) -> Result<Filter, ValidationErrors> {
        let marker = format!("{}__", self.prefix);
        let stripped: Map<String, Value> = mapping
            .iter()
            .map(|(key, value)| {
                let key = key.strip_prefix(&marker).unwrap_or(key);
                (key.to_string(), value.clone())
            })
            .collect();
        Filter::from_mapping(&self.original, &stripped)
    }
}

impl From<NestedFilter> for FieldType {
    fn from(nested: NestedFilter) -> Self {
        Self::Nested(nested)
    }
}
