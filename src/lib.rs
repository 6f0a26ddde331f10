//! Declarative, validated query filters for Axum and Sea-ORM APIs.
//!
//! Declare a [`FilterSchema`] once, bind query parameters to it with
//! [`FilterDepends`], and apply the resulting [`Filter`] to a sea-orm select
//! through [`SeaOrmBackend`].

pub mod adapt;
pub mod depends;
pub mod errors;
pub mod filter;
pub mod filtering;
pub mod openapi;
pub mod ordering;
pub mod prefix;
pub mod schema;
pub mod validation;
pub mod value;

pub use adapt::adapt;
pub use depends::{BoundFilter, FilterDepends};
pub use errors::{ApiError, FilterError};
pub use filter::Filter;
pub use filtering::{FilterBackend, SeaOrmBackend};
pub use ordering::{Direction, OrderingToken};
pub use prefix::{NestedFilter, with_prefix};
pub use schema::{
    FieldDefault, FieldSpec, FieldType, FilterConstants, FilterSchema, ModelDescriptor,
};
pub use validation::{ValidationError, ValidationErrors};
pub use value::FilterValue;
