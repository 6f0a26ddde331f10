//! Filter instances.
//!
//! A [`Filter`] is one validated set of criteria built from raw input against
//! a [`FilterSchema`]. Construction is all-or-nothing: every field error is
//! collected, and no instance exists unless all fields validated.

use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::sync::Arc;

use crate::errors::FilterError;
use crate::filtering::FilterBackend;
use crate::ordering::OrderingToken;
use crate::schema::{FieldDefault, FieldSpec, FilterSchema};
use crate::validation::{LocItem, ValidationError, ValidationErrors};
use crate::value::FilterValue;

#[derive(Debug, Clone)]
pub struct Filter {
    schema: Arc<FilterSchema>,
    /// One value per schema field, in declaration order
    values: Vec<FilterValue>,
    /// Names of the fields that were present in the input
    fields_set: BTreeSet<String>,
}

impl PartialEq for Filter {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.schema, &other.schema)
            && self.values == other.values
            && self.fields_set == other.fields_set
    }
}

impl Filter {
    /// Validate a raw mapping keyed by external field names.
    ///
    /// Keys that match no field are rejected, missing required fields are
    /// reported, and every present value runs through the schema's
    /// before-validators and then type coercion.
    ///
    /// # Errors
    ///
    /// Returns every field failure at once, located by external name.
    pub fn from_mapping(
        schema: &Arc<FilterSchema>,
        input: &Map<String, Value>,
    ) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let mut values = Vec::with_capacity(schema.fields().len());
        let mut fields_set = BTreeSet::new();

        for field in schema.fields() {
            let external = schema.external_name(field);
            match input.get(external.as_ref()) {
                Some(raw) => match validate_field(schema, field, raw.clone()) {
                    Ok(value) => {
                        values.push(value);
                        fields_set.insert(field.name().to_string());
                    }
                    Err(field_errors) => {
                        errors.extend_within(&LocItem::from(external.as_ref()), field_errors);
                    }
                },
                None => match field.default() {
                    FieldDefault::Required => errors.add(ValidationError::new(
                        external.as_ref(),
                        "missing",
                        "Field required",
                    )),
                    FieldDefault::Value(default) => values.push(default.clone()),
                },
            }
        }

        let known: BTreeSet<_> = schema
            .fields()
            .iter()
            .map(|field| schema.external_name(field))
            .collect();
        for key in input.keys() {
            if !known.contains(key.as_str()) {
                errors.add(ValidationError::new(
                    key.as_str(),
                    "extra_forbidden",
                    "Extra inputs are not permitted",
                ));
            }
        }

        errors.into_result()?;
        Ok(Self {
            schema: Arc::clone(schema),
            values,
            fields_set,
        })
    }

    #[must_use]
    pub const fn schema(&self) -> &Arc<FilterSchema> {
        &self.schema
    }

    /// Value of a field by declared name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&FilterValue> {
        self.schema
            .fields()
            .iter()
            .position(|field| field.name() == name)
            .map(|index| &self.values[index])
    }

    /// Whether the field was explicitly supplied rather than defaulted
    #[must_use]
    pub fn is_set(&self, name: &str) -> bool {
        self.fields_set.contains(name)
    }

    fn entries(&self) -> impl Iterator<Item = (&FieldSpec, &FilterValue)> {
        self.schema.fields().iter().zip(&self.values)
    }

    /// Explicitly supplied, non-null criteria in declaration order.
    ///
    /// The ordering field is never included.
    #[must_use]
    pub fn filtering_fields(&self) -> Vec<(&str, &FilterValue)> {
        self.entries()
            .filter(|(field, value)| {
                !self.schema.is_ordering_field(field)
                    && self.is_set(field.name())
                    && !value.is_null()
            })
            .map(|(field, value)| (field.name(), value))
            .collect()
    }

    /// Parsed ordering directive.
    ///
    /// The ordering field must be declared as a list of text; a null value
    /// means no ordering.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::Configuration`] if the schema does not declare
    /// the field its constants name as the ordering field.
    pub fn ordering_values(&self) -> Result<Vec<OrderingToken>, FilterError> {
        let name = &self.schema.constants().ordering_field_name;
        let value = self.get(name).ok_or_else(|| {
            FilterError::configuration(format!(
                "Ordering field {name} is not defined. Make sure to add it to your filter schema."
            ))
        })?;

        let tokens = value
            .as_list()
            .unwrap_or_default()
            .iter()
            .filter_map(FilterValue::as_str)
            .map(OrderingToken::parse)
            .collect();
        Ok(tokens)
    }

    /// Dump to a raw mapping that [`Filter::from_mapping`] accepts again
    #[must_use]
    pub fn to_mapping(&self, by_alias: bool, exclude_unset: bool) -> Map<String, Value> {
        self.entries()
            .filter(|(field, _)| !exclude_unset || self.is_set(field.name()))
            .map(|(field, value)| {
                let key = if by_alias {
                    self.schema.external_name(field).into_owned()
                } else {
                    field.name().to_string()
                };
                (key, value.to_json(by_alias, exclude_unset))
            })
            .collect()
    }

    /// Apply the criteria to `query` through `backend`
    ///
    /// # Errors
    ///
    /// Returns whatever the backend reports for criteria it cannot express.
    pub fn filter<Q, B>(&self, backend: &B, query: Q) -> Result<Q, FilterError>
    where
        B: FilterBackend<Q> + ?Sized,
    {
        backend.filter(self, query)
    }

    /// Apply the ordering directive to `query` through `backend`
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::Configuration`] if the schema does not declare
    /// its ordering field.
    pub fn sort<Q, B>(&self, backend: &B, query: Q) -> Result<Q, FilterError>
    where
        B: FilterBackend<Q> + ?Sized,
    {
        backend.sort(self, query)
    }
}

fn validate_field(
    schema: &FilterSchema,
    field: &FieldSpec,
    raw: Value,
) -> Result<FilterValue, ValidationErrors> {
    let mut value = raw;
    for validator in schema.before_validators() {
        value = (validator.apply)(schema, field, value)?;
    }
    field.coerce(&value)
}
