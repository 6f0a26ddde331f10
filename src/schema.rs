//! # Filter Schemas
//!
//! A [`FilterSchema`] is the declaration of a filter: which criteria fields a
//! client may send, how each is typed, which field carries the ordering
//! directive, and which entity the filter targets. Schemas are built once,
//! wrapped in an [`Arc`], and shared read-only by every request.
//!
//! ## Declaring a schema
//!
//! ```rust
//! use filtercrate::schema::{FieldSpec, FieldType, FilterSchema, ModelDescriptor};
//!
//! let model = ModelDescriptor::new("todos", ["id", "title", "priority", "created_at"]);
//! let schema = FilterSchema::builder("TodoFilter", model)
//!     .field(FieldSpec::optional("title", FieldType::Text))
//!     .field(FieldSpec::optional("priority__gte", FieldType::Integer))
//!     .field(FieldSpec::optional("title__in", FieldType::list(FieldType::Text)))
//!     .field(FieldSpec::optional("order_by", FieldType::list(FieldType::Text)))
//!     .build();
//!
//! assert_eq!(schema.constants().ordering_field_name, "order_by");
//! assert!(schema.field("priority__gte").is_some());
//! ```
//!
//! ## Query parameter names
//!
//! A field is bound from the query parameter returned by
//! [`FilterSchema::external_name`]: its explicit alias if it has one,
//! otherwise `<prefix>__<name>` when the schema was produced by
//! [`with_prefix`](crate::prefix::with_prefix), otherwise its own name.

use sea_orm::{EntityTrait, IdenStatic, Iterable};
use serde_json::Value;
use std::borrow::Cow;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use crate::ordering;
use crate::prefix::NestedFilter;
use crate::validation::{LocItem, ValidationError, ValidationErrors};
use crate::value::{
    FilterValue, coerce_bool, coerce_float, coerce_integer, coerce_text, coerce_uuid,
    split_comma_list,
};

pub const DEFAULT_ORDERING_FIELD_NAME: &str = "order_by";
pub const DEFAULT_SEARCH_FIELD_NAME: &str = "search";

/// Declared type of a filter field.
///
/// Optionality is not part of the type; see [`FieldSpec::is_nullable`].
#[derive(Debug, Clone, PartialEq)]
pub enum FieldType {
    Boolean,
    Integer,
    Float,
    Text,
    Uuid,
    List(Box<FieldType>),
    /// Any of several alternatives, tried in order
    Union(Vec<FieldType>),
    /// A prefixed filter reconstructed into its original schema
    Nested(NestedFilter),
}

impl FieldType {
    #[must_use]
    pub fn list(inner: Self) -> Self {
        Self::List(Box::new(inner))
    }

    #[must_use]
    pub const fn is_list(&self) -> bool {
        matches!(self, Self::List(_))
    }

    /// Error kind reported when the input has the wrong shape entirely
    const fn type_error(&self) -> (&'static str, &'static str) {
        match self {
            Self::Boolean => ("bool_type", "Input should be a valid boolean"),
            Self::Integer => ("int_type", "Input should be a valid integer"),
            Self::Float => ("float_type", "Input should be a valid number"),
            Self::Text => ("string_type", "Input should be a valid string"),
            Self::Uuid => ("uuid_type", "UUID input should be a string"),
            Self::List(_) => ("list_type", "Input should be a valid list"),
            Self::Union(_) => ("union_type", "Input does not match any allowed type"),
            Self::Nested(_) => ("model_type", "Input should be a valid filter"),
        }
    }

    /// Coerce a non-null raw value. Error locations are relative to the field.
    pub(crate) fn coerce(&self, raw: &Value) -> Result<FilterValue, ValidationErrors> {
        if raw.is_null() {
            let (kind, msg) = self.type_error();
            return Err(ValidationError::unlocated(kind, msg).into());
        }
        match self {
            Self::Boolean => coerce_bool(raw).map_err(Into::into),
            Self::Integer => coerce_integer(raw).map_err(Into::into),
            Self::Float => coerce_float(raw).map_err(Into::into),
            Self::Text => coerce_text(raw).map_err(Into::into),
            Self::Uuid => coerce_uuid(raw).map_err(Into::into),
            Self::List(inner) => {
                let items = match raw {
                    Value::Array(items) => items.clone(),
                    Value::String(text) => split_comma_list(text),
                    _ => {
                        let (kind, msg) = self.type_error();
                        return Err(ValidationError::unlocated(kind, msg).into());
                    }
                };
                let mut errors = ValidationErrors::new();
                let mut values = Vec::with_capacity(items.len());
                for (index, item) in items.iter().enumerate() {
                    match inner.coerce(item) {
                        Ok(value) => values.push(value),
                        Err(nested) => errors.extend_within(&LocItem::Index(index), nested),
                    }
                }
                errors.into_result()?;
                Ok(FilterValue::List(values))
            }
            Self::Union(alternatives) => alternatives
                .iter()
                .find_map(|alternative| alternative.coerce(raw).ok())
                .ok_or_else(|| {
                    let (kind, msg) = self.type_error();
                    ValidationError::unlocated(kind, msg).into()
                }),
            Self::Nested(nested) => nested.reconstruct(raw).map(FilterValue::from),
        }
    }
}

/// Default of a field; a field without one is required
#[derive(Debug, Clone, PartialEq)]
pub enum FieldDefault {
    Required,
    Value(FilterValue),
}

/// Declaration of one filter field
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    name: String,
    ty: FieldType,
    nullable: bool,
    default: FieldDefault,
    alias: Option<String>,
    description: Option<String>,
}

impl FieldSpec {
    /// A required, non-nullable field
    pub fn required(name: impl Into<String>, ty: FieldType) -> Self {
        Self {
            name: name.into(),
            ty,
            nullable: false,
            default: FieldDefault::Required,
            alias: None,
            description: None,
        }
    }

    /// A nullable field defaulting to null
    pub fn optional(name: impl Into<String>, ty: FieldType) -> Self {
        Self {
            name: name.into(),
            ty,
            nullable: true,
            default: FieldDefault::Value(FilterValue::Null),
            alias: None,
            description: None,
        }
    }

    #[must_use]
    pub fn with_default(mut self, value: impl Into<FilterValue>) -> Self {
        self.default = FieldDefault::Value(value.into());
        self
    }

    /// Bind this field from `alias` instead of its computed name.
    ///
    /// An explicit alias wins over the `<prefix>__` rename applied by
    /// [`with_prefix`](crate::prefix::with_prefix).
    #[must_use]
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn ty(&self) -> &FieldType {
        &self.ty
    }

    #[must_use]
    pub const fn is_nullable(&self) -> bool {
        self.nullable
    }

    #[must_use]
    pub const fn is_required(&self) -> bool {
        matches!(self.default, FieldDefault::Required)
    }

    #[must_use]
    pub const fn default(&self) -> &FieldDefault {
        &self.default
    }

    #[must_use]
    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Same field identity with a different type and default
    pub(crate) fn retyped(&self, ty: FieldType, default: FieldDefault) -> Self {
        Self {
            ty,
            default,
            ..self.clone()
        }
    }

    /// Coerce a raw value, honouring nullability
    pub(crate) fn coerce(&self, raw: &Value) -> Result<FilterValue, ValidationErrors> {
        if raw.is_null() && self.nullable {
            return Ok(FilterValue::Null);
        }
        self.ty.coerce(raw)
    }
}

/// The set of attribute names the filtered entity exposes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelDescriptor {
    name: String,
    fields: BTreeSet<String>,
}

impl ModelDescriptor {
    pub fn new(
        name: impl Into<String>,
        fields: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            name: name.into(),
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }

    /// Describe a sea-orm entity by its table name and column names
    #[must_use]
    pub fn from_entity<E: EntityTrait>() -> Self {
        let entity = E::default();
        Self::new(
            entity.table_name(),
            <E::Column as Iterable>::iter().map(|column| column.as_str().to_string()),
        )
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn has_field(&self, field_name: &str) -> bool {
        self.fields.contains(field_name)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(String::as_str)
    }
}

/// Schema-level metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterConstants {
    /// Entity the filter targets; ordering tokens must name one of its fields
    pub model: ModelDescriptor,
    pub ordering_field_name: String,
    /// Columns matched by the free-text search field
    pub search_model_fields: Vec<String>,
    pub search_field_name: String,
    /// Set on schemas produced by [`with_prefix`](crate::prefix::with_prefix)
    pub prefix: Option<String>,
}

impl FilterConstants {
    #[must_use]
    pub fn new(model: ModelDescriptor) -> Self {
        Self {
            model,
            ordering_field_name: DEFAULT_ORDERING_FIELD_NAME.to_string(),
            search_model_fields: Vec::new(),
            search_field_name: DEFAULT_SEARCH_FIELD_NAME.to_string(),
            prefix: None,
        }
    }
}

/// Field-level step run on raw input before type coercion
#[derive(Clone, Copy)]
pub struct BeforeValidator {
    pub name: &'static str,
    pub apply: fn(&FilterSchema, &FieldSpec, Value) -> Result<Value, ValidationError>,
}

impl fmt::Debug for BeforeValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("BeforeValidator").field(&self.name).finish()
    }
}

/// A closed filter declaration: unknown input fields are rejected
#[derive(Debug, Clone)]
pub struct FilterSchema {
    name: String,
    fields: Vec<FieldSpec>,
    constants: FilterConstants,
    before_validators: Vec<BeforeValidator>,
}

impl FilterSchema {
    pub fn builder(name: impl Into<String>, model: ModelDescriptor) -> FilterSchemaBuilder {
        FilterSchemaBuilder {
            name: name.into(),
            fields: Vec::new(),
            constants: FilterConstants::new(model),
        }
    }

    /// Build a sibling schema sharing this one's name
    pub(crate) fn derive(
        &self,
        fields: Vec<FieldSpec>,
        constants: FilterConstants,
        before_validators: Vec<BeforeValidator>,
    ) -> Self {
        Self {
            name: self.name.clone(),
            fields,
            constants,
            before_validators,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fields in declaration order
    #[must_use]
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|field| field.name == name)
    }

    #[must_use]
    pub const fn constants(&self) -> &FilterConstants {
        &self.constants
    }

    #[must_use]
    pub fn before_validators(&self) -> &[BeforeValidator] {
        &self.before_validators
    }

    /// Name under which `field` is bound from input
    #[must_use]
    pub fn external_name<'a>(&'a self, field: &'a FieldSpec) -> Cow<'a, str> {
        if let Some(alias) = field.alias() {
            return Cow::Borrowed(alias);
        }
        match &self.constants.prefix {
            Some(prefix) => Cow::Owned(format!("{prefix}__{}", field.name)),
            None => Cow::Borrowed(&field.name),
        }
    }

    #[must_use]
    pub fn is_ordering_field(&self, field: &FieldSpec) -> bool {
        field.name == self.constants.ordering_field_name
    }
}

/// Builder for [`FilterSchema`]
#[derive(Debug)]
pub struct FilterSchemaBuilder {
    name: String,
    fields: Vec<FieldSpec>,
    constants: FilterConstants,
}

impl FilterSchemaBuilder {
    /// Declare a field; redeclaring a name replaces the earlier declaration
    #[must_use]
    pub fn field(mut self, field: FieldSpec) -> Self {
        match self.fields.iter_mut().find(|existing| existing.name == field.name) {
            Some(existing) => *existing = field,
            None => self.fields.push(field),
        }
        self
    }

    #[must_use]
    pub fn ordering_field_name(mut self, name: impl Into<String>) -> Self {
        self.constants.ordering_field_name = name.into();
        self
    }

    #[must_use]
    pub fn search_field_name(mut self, name: impl Into<String>) -> Self {
        self.constants.search_field_name = name.into();
        self
    }

    #[must_use]
    pub fn search_model_fields(
        mut self,
        fields: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.constants.search_model_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn build(self) -> Arc<FilterSchema> {
        Arc::new(FilterSchema {
            name: self.name,
            fields: self.fields,
            constants: self.constants,
            before_validators: ordering::ORDERING_VALIDATORS.to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn model() -> ModelDescriptor {
        ModelDescriptor::new("todos", ["id", "title", "priority"])
    }

    #[test]
    fn test_builder_defaults() {
        let schema = FilterSchema::builder("TodoFilter", model())
            .field(FieldSpec::optional("title", FieldType::Text))
            .build();
        let constants = schema.constants();
        assert_eq!(constants.ordering_field_name, DEFAULT_ORDERING_FIELD_NAME);
        assert_eq!(constants.search_field_name, DEFAULT_SEARCH_FIELD_NAME);
        assert!(constants.search_model_fields.is_empty());
        assert!(constants.prefix.is_none());
        assert_eq!(schema.before_validators().len(), 2);
    }

    #[test]
    fn test_redeclared_field_replaces() {
        let schema = FilterSchema::builder("TodoFilter", model())
            .field(FieldSpec::optional("title", FieldType::Text))
            .field(FieldSpec::required("title", FieldType::Integer))
            .build();
        assert_eq!(schema.fields().len(), 1);
        assert!(schema.fields()[0].is_required());
        assert_eq!(schema.fields()[0].ty(), &FieldType::Integer);
    }

    #[test]
    fn test_external_name_prefers_alias() {
        let schema = FilterSchema::builder("TodoFilter", model())
            .field(FieldSpec::optional("title", FieldType::Text).with_alias("name"))
            .build();
        assert_eq!(schema.external_name(&schema.fields()[0]), "name");
    }

    #[test]
    fn test_model_descriptor_lookup() {
        let model = model();
        assert!(model.has_field("priority"));
        assert!(!model.has_field("owner"));
        assert_eq!(model.fields().collect::<Vec<_>>(), vec!["id", "priority", "title"]);
    }

    #[test]
    fn test_field_coerce_nullability() {
        let optional = FieldSpec::optional("count", FieldType::Integer);
        assert_eq!(optional.coerce(&Value::Null).unwrap(), FilterValue::Null);

        let required = FieldSpec::required("count", FieldType::Integer);
        let errors = required.coerce(&Value::Null).unwrap_err();
        assert_eq!(errors.errors()[0].kind, "int_type");
    }

    #[test]
    fn test_list_coerce_from_string_and_array() {
        let ty = FieldType::list(FieldType::Integer);
        assert_eq!(ty.coerce(&json!("1,2")).unwrap(), FilterValue::from(vec![1, 2]));
        assert_eq!(ty.coerce(&json!([3, "4"])).unwrap(), FilterValue::from(vec![3, 4]));
    }

    #[test]
    fn test_list_coerce_reports_index() {
        let ty = FieldType::list(FieldType::Integer);
        let errors = ty.coerce(&json!("1,x")).unwrap_err();
        assert_eq!(
            errors.errors()[0].to_string(),
            "1: Input should be a valid integer, unable to parse string as an integer"
        );
    }

    #[test]
    fn test_union_takes_first_match() {
        let ty = FieldType::Union(vec![FieldType::Integer, FieldType::Text]);
        assert_eq!(ty.coerce(&json!("7")).unwrap(), FilterValue::Int(7));
        assert_eq!(ty.coerce(&json!("seven")).unwrap(), FilterValue::from("seven"));
        assert_eq!(ty.coerce(&json!([1])).unwrap_err().errors()[0].kind, "union_type");
    }
}
