//! # Request Binding
//!
//! [`FilterDepends`] is the web-boundary wrapper around a filter schema. It
//! binds query parameters against the query-string form of the schema (see
//! [`adapt`](crate::adapt::adapt)), so list fields arrive as comma-separated
//! strings, and then rebuilds a [`Filter`] of the declared schema from the
//! bound values. Both steps report failures as [`ApiError::RequestValidation`],
//! so a handler answers 422 with the same body either way.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use axum::{Json, extract::{Query, State}};
//! use filtercrate::{ApiError, FilterDepends, SeaOrmBackend};
//!
//! async fn list_todos(
//!     State(state): State<AppState>,
//!     Query(params): Query<Vec<(String, String)>>,
//! ) -> Result<Json<Vec<todo::Model>>, ApiError> {
//!     let bound = state.todo_filter.bind(params)?;
//!     let query = bound.filter(&SeaOrmBackend, todo::Entity::find())?;
//!     let query = bound.sort(&SeaOrmBackend, query)?;
//!     Ok(Json(query.all(&state.db).await?))
//! }
//! ```
//!
//! Parameters belonging to a nested filter (`number_filter__count=5`, or an
//! inner field's alias) are grouped under the nested field before validation.

use serde_json::{Map, Value};
use std::sync::Arc;
use utoipa::openapi::path::Parameter;

use crate::adapt::adapt;
use crate::errors::ApiError;
use crate::filter::Filter;
use crate::filtering::FilterBackend;
use crate::openapi::query_parameters;
use crate::schema::{FieldType, FilterSchema};

/// Binds request parameters to a filter schema
#[derive(Debug, Clone)]
pub struct FilterDepends {
    original: Arc<FilterSchema>,
    adapted: Arc<FilterSchema>,
    by_alias: bool,
    use_cache: bool,
}

impl FilterDepends {
    #[must_use]
    pub fn new(schema: &Arc<FilterSchema>) -> Self {
        Self {
            original: Arc::clone(schema),
            adapted: adapt(schema),
            by_alias: false,
            use_cache: true,
        }
    }

    /// Dump bound values by external name instead of field name when
    /// rebuilding the declared schema.
    ///
    /// Needed when the declared schema has aliased or prefixed fields, since
    /// those are only accepted under their external names.
    #[must_use]
    pub const fn by_alias(mut self, by_alias: bool) -> Self {
        self.by_alias = by_alias;
        self
    }

    /// Recorded for frameworks that memoize dependencies per request
    #[must_use]
    pub const fn use_cache(mut self, use_cache: bool) -> Self {
        self.use_cache = use_cache;
        self
    }

    #[must_use]
    pub const fn original(&self) -> &Arc<FilterSchema> {
        &self.original
    }

    /// The query-string form parameters are bound against
    #[must_use]
    pub const fn adapted(&self) -> &Arc<FilterSchema> {
        &self.adapted
    }

    #[must_use]
    pub const fn is_by_alias(&self) -> bool {
        self.by_alias
    }

    #[must_use]
    pub const fn uses_cache(&self) -> bool {
        self.use_cache
    }

    /// OpenAPI description of the bound query parameters
    #[must_use]
    pub fn parameters(&self) -> Vec<Parameter> {
        query_parameters(&self.adapted)
    }

    /// Bind raw query parameters.
    ///
    /// A parameter repeated in the query keeps its last value.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::RequestValidation`] listing every parameter that
    /// failed to bind.
    pub fn bind<K, V>(
        &self,
        params: impl IntoIterator<Item = (K, V)>,
    ) -> Result<BoundFilter, ApiError>
    where
        K: Into<String>,
        V: Into<String>,
    {
        let mut mapping = Map::new();
        for (key, value) in params {
            let key = key.into();
            let value = Value::String(value.into());
            match self.nested_group(&key) {
                Some(group) => {
                    let entry = mapping
                        .entry(group)
                        .or_insert_with(|| Value::Object(Map::new()));
                    if let Value::Object(members) = entry {
                        members.insert(key, value);
                    }
                }
                None => {
                    mapping.insert(key, value);
                }
            }
        }
        self.bind_mapping(&mapping)
    }

    /// Bind an already-structured mapping keyed by external names.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::RequestValidation`] if the mapping does not
    /// validate against the query-string form of the schema.
    pub fn bind_mapping(&self, mapping: &Map<String, Value>) -> Result<BoundFilter, ApiError> {
        let adapted = Filter::from_mapping(&self.adapted, mapping).map_err(|errors| {
            tracing::debug!(
                filter = self.original.name(),
                errors = errors.len(),
                "Query parameters failed to bind"
            );
            ApiError::request_validation(errors)
        })?;
        Ok(BoundFilter {
            adapted,
            depends: self.clone(),
        })
    }

    /// External name of the nested field that owns `key`, if any
    fn nested_group(&self, key: &str) -> Option<String> {
        let is_direct = self
            .adapted
            .fields()
            .iter()
            .any(|field| self.adapted.external_name(field) == key);
        if is_direct {
            return None;
        }

        self.adapted.fields().iter().find_map(|field| match field.ty() {
            FieldType::Nested(nested) if nested.binds_parameter(key) => {
                Some(self.adapted.external_name(field).into_owned())
            }
            _ => None,
        })
    }
}

/// Query parameters bound against the query-string form of a schema
#[derive(Debug, Clone)]
pub struct BoundFilter {
    adapted: Filter,
    depends: FilterDepends,
}

impl BoundFilter {
    /// The instance as bound, with lists still comma-joined
    #[must_use]
    pub const fn adapted(&self) -> &Filter {
        &self.adapted
    }

    /// Rebuild an instance of the declared schema from the bound values.
    ///
    /// Every bound value is carried over, defaults included, so a declared
    /// default acts as a criterion even when the request omits it.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::RequestValidation`] if a bound value is invalid for
    /// the declared schema, such as an unknown ordering field.
    pub fn reconstruct(&self) -> Result<Filter, ApiError> {
        let mapping = self.adapted.to_mapping(self.depends.by_alias, false);
        Filter::from_mapping(&self.depends.original, &mapping).map_err(|errors| {
            tracing::debug!(
                filter = self.depends.original.name(),
                errors = %errors,
                "Filter failed to reconstruct"
            );
            ApiError::request_validation(errors)
        })
    }

    /// Rebuild the declared filter and apply its criteria to `query`
    ///
    /// # Errors
    ///
    /// Returns a 422 [`ApiError`] if reconstruction fails and a 500 if the
    /// backend reports a misconfigured schema.
    pub fn filter<Q, B>(&self, backend: &B, query: Q) -> Result<Q, ApiError>
    where
        B: FilterBackend<Q> + ?Sized,
    {
        self.reconstruct()?
            .filter(backend, query)
            .map_err(ApiError::from)
    }

    /// Rebuild the declared filter and apply its ordering to `query`
    ///
    /// # Errors
    ///
    /// Returns a 422 [`ApiError`] if reconstruction fails and a 500 if the
    /// declared schema has no ordering field.
    pub fn sort<Q, B>(&self, backend: &B, query: Q) -> Result<Q, ApiError>
    where
        B: FilterBackend<Q> + ?Sized,
    {
        self.reconstruct()?
            .sort(backend, query)
            .map_err(ApiError::from)
    }
}
