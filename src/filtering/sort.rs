use sea_orm::{
    QueryOrder,
    sea_query::{Alias, Expr, Order},
};

use crate::ordering::{Direction, OrderingToken};

impl From<Direction> for Order {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::Asc => Self::Asc,
            Direction::Desc => Self::Desc,
        }
    }
}

/// Add one `ORDER BY` term per token, in token order
pub fn apply_ordering<Q: QueryOrder>(mut query: Q, tokens: &[OrderingToken]) -> Q {
    for token in tokens {
        query.query().order_by_expr(
            Expr::col(Alias::new(token.field.as_str())).into(),
            token.direction.into(),
        );
    }
    query
}
