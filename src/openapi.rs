//! OpenAPI description of filter query parameters.
//!
//! Describes the parameters a [`FilterDepends`](crate::depends::FilterDepends)
//! binds, for inclusion in a utoipa-generated document. Nested filters are
//! flattened into their `<prefix>__<field>` parameters.

use utoipa::openapi::{
    Required,
    path::{Parameter, ParameterBuilder, ParameterIn},
    schema::{ObjectBuilder, Schema, SchemaFormat, Type},
};

use crate::adapt::adapt;
use crate::prefix::with_prefix;
use crate::schema::{FieldType, FilterSchema};

/// One query parameter per field of `schema`, in declaration order
#[must_use]
pub fn query_parameters(schema: &FilterSchema) -> Vec<Parameter> {
    let mut parameters = Vec::with_capacity(schema.fields().len());

    for field in schema.fields() {
        if let FieldType::Nested(nested) = field.ty() {
            let (prefixed, _) = with_prefix(nested.prefix(), nested.original());
            parameters.extend(query_parameters(&adapt(&prefixed)));
            continue;
        }

        let (schema_type, format) = openapi_type(field.ty());
        let mut schema_builder = ObjectBuilder::new().schema_type(schema_type);
        if let Some(format) = format {
            schema_builder = schema_builder.format(Some(format));
        }

        let parameter = ParameterBuilder::new()
            .name(schema.external_name(field))
            .parameter_in(ParameterIn::Query)
            .required(if field.is_required() {
                Required::True
            } else {
                Required::False
            })
            .description(field.description())
            .schema(Some(Schema::Object(schema_builder.build())))
            .build();
        parameters.push(parameter);
    }

    parameters
}

/// Lists travel as comma-separated strings
fn openapi_type(ty: &FieldType) -> (Type, Option<SchemaFormat>) {
    match ty {
        FieldType::Boolean => (Type::Boolean, None),
        FieldType::Integer => (Type::Integer, None),
        FieldType::Float => (Type::Number, None),
        FieldType::Uuid => (Type::String, Some(SchemaFormat::Custom("uuid".to_string()))),
        FieldType::Union(alternatives) if alternatives.len() == 1 => openapi_type(&alternatives[0]),
        FieldType::Text | FieldType::List(_) | FieldType::Union(_) => (Type::String, None),
        FieldType::Nested(_) => (Type::Object, None),
    }
}
