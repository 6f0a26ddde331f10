//! # Query Backends
//!
//! A [`Filter`] knows what the client asked for; a [`FilterBackend`] knows how
//! to express that against a concrete query type. The crate ships
//! [`SeaOrmBackend`], which applies criteria to anything implementing
//! sea-orm's [`QueryFilter`] and [`QueryOrder`], such as `Entity::find()`.
//!
//! ## Field naming convention
//!
//! Criteria field names map onto columns as `<column>[__<operator>]`:
//!
//! ```rust,ignore
//! // Equality
//! GET /todos?completed=true
//!
//! // Comparisons
//! GET /todos?priority__gte=3&priority__lt=8
//! GET /todos?status__neq=archived
//!
//! // List membership (comma-separated in the query string)
//! GET /todos?title__in=write,test
//! GET /todos?priority__not_in=1,2
//!
//! // Null checks and substring matches
//! GET /todos?due_date__isnull=true
//! GET /todos?title__ilike=urgent
//!
//! // Free-text search over the schema's search columns
//! GET /todos?search=report
//!
//! // Ordering
//! GET /todos?order_by=-priority,title
//! ```
//!
//! Nested filters add their own criteria to the same `AND` condition.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let filter = bound.reconstruct()?;
//! let query = filter.filter(&SeaOrmBackend, todo::Entity::find())?;
//! let query = filter.sort(&SeaOrmBackend, query)?;
//! let todos = query.all(&db).await?;
//! ```

pub mod conditions;
pub mod search;
pub mod sort;

use sea_orm::{QueryFilter, QueryOrder};

use crate::errors::FilterError;
use crate::filter::Filter;

pub use conditions::{FilterOperator, build_condition, split_field_operator};
pub use search::build_search_condition;
pub use sort::apply_ordering;

/// Applies a filter's criteria and ordering to a query of type `Q`
pub trait FilterBackend<Q> {
    /// Narrow `query` by the filter's criteria
    ///
    /// # Errors
    ///
    /// Returns an error if the filter cannot be expressed for this backend.
    fn filter(&self, filter: &Filter, query: Q) -> Result<Q, FilterError>;

    /// Order `query` by the filter's ordering directive
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::Configuration`] if the filter's schema does not
    /// declare its ordering field.
    fn sort(&self, filter: &Filter, query: Q) -> Result<Q, FilterError>;
}

/// Backend for sea-orm select queries
#[derive(Debug, Clone, Copy, Default)]
pub struct SeaOrmBackend;

impl<Q> FilterBackend<Q> for SeaOrmBackend
where
    Q: QueryFilter + QueryOrder,
{
    fn filter(&self, filter: &Filter, query: Q) -> Result<Q, FilterError> {
        let condition = build_condition(filter);
        if condition.is_empty() {
            return Ok(query);
        }
        tracing::debug!(
            filter = filter.schema().name(),
            model = filter.schema().constants().model.name(),
            "Applying filter criteria"
        );
        Ok(query.filter(condition))
    }

    fn sort(&self, filter: &Filter, query: Q) -> Result<Q, FilterError> {
        let tokens = filter.ordering_values()?;
        tracing::debug!(
            filter = filter.schema().name(),
            tokens = tokens.len(),
            "Applying ordering"
        );
        Ok(apply_ordering(query, &tokens))
    }
}
