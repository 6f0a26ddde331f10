//! Query-string adaptation of filter schemas.
//!
//! Query parameters carry lists as one comma-separated string. [`adapt`]
//! derives a schema in which every list-typed field is declared as text, so a
//! parameter such as `?name__in=a,b` binds as the string `"a,b"` and is only
//! split into a list when the instance is rebuilt against the declared
//! schema.

use std::sync::Arc;

use crate::schema::{FieldDefault, FieldSpec, FieldType, FilterSchema};
use crate::value::FilterValue;

/// Derive the query-string form of `schema`.
///
/// Field order, names, aliases, required-ness and nullability are kept.
/// Only list-typed fields change. A union with exactly one alternative is
/// treated as that alternative; unions of several alternatives are kept
/// unchanged even when they contain a list.
///
/// The derived schema runs no before-validators. Ordering rules apply when
/// the bound instance is rebuilt into `schema`.
#[must_use]
pub fn adapt(schema: &FilterSchema) -> Arc<FilterSchema> {
    let fields = schema.fields().iter().map(adapt_field).collect();
    Arc::new(schema.derive(fields, schema.constants().clone(), Vec::new()))
}

fn adapt_field(field: &FieldSpec) -> FieldSpec {
    let resolved = match field.ty() {
        FieldType::Union(alternatives) if alternatives.len() == 1 => &alternatives[0],
        other => other,
    };
    if !resolved.is_list() {
        return field.clone();
    }

    let default = match field.default() {
        FieldDefault::Value(list @ FilterValue::List(_)) => {
            FieldDefault::Value(FilterValue::Text(list.to_string()))
        }
        other => other.clone(),
    };
    field.retyped(FieldType::Text, default)
}
