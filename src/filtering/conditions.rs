use sea_orm::{
    Condition, Value,
    sea_query::{Alias, Expr, SimpleExpr},
};

use super::search::{build_like_condition, build_search_condition};
use crate::filter::Filter;
use crate::value::FilterValue;

/// Comparison operator encoded in a criteria field name suffix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOperator {
    /// Equality (=), the operator of an unsuffixed field
    Eq,
    /// Not equal (!=)
    Neq,
    /// Greater than (>)
    Gt,
    /// Greater than or equal (>=)
    Gte,
    /// Less than (<)
    Lt,
    /// Less than or equal (<=)
    Lte,
    /// Case-sensitive substring match
    Like,
    /// Case-insensitive substring match
    Ilike,
    /// IN (list of values)
    In,
    /// NOT IN (list of values)
    NotIn,
    /// IS NULL when true, IS NOT NULL when false
    IsNull,
}

impl FilterOperator {
    /// Parse operator from field name suffix (e.g., "gte", "not_in")
    #[must_use]
    pub fn from_suffix(suffix: &str) -> Option<Self> {
        match suffix {
            "neq" => Some(Self::Neq),
            "gt" => Some(Self::Gt),
            "gte" => Some(Self::Gte),
            "lt" => Some(Self::Lt),
            "lte" => Some(Self::Lte),
            "like" => Some(Self::Like),
            "ilike" => Some(Self::Ilike),
            "in" => Some(Self::In),
            "not_in" => Some(Self::NotIn),
            "isnull" => Some(Self::IsNull),
            _ => None,
        }
    }

    /// Get the suffix for this operator
    #[must_use]
    pub const fn suffix(&self) -> &'static str {
        match self {
            Self::Eq => "",
            Self::Neq => "neq",
            Self::Gt => "gt",
            Self::Gte => "gte",
            Self::Lt => "lt",
            Self::Lte => "lte",
            Self::Like => "like",
            Self::Ilike => "ilike",
            Self::In => "in",
            Self::NotIn => "not_in",
            Self::IsNull => "isnull",
        }
    }
}

/// Split a criteria field name into its column and operator.
///
/// Only a recognised suffix after the last `__` counts as an operator, so
/// `created__at` stays a plain equality on `created__at`.
#[must_use]
pub fn split_field_operator(field_name: &str) -> (&str, FilterOperator) {
    field_name
        .rsplit_once("__")
        .and_then(|(column, suffix)| {
            FilterOperator::from_suffix(suffix).map(|operator| (column, operator))
        })
        .unwrap_or((field_name, FilterOperator::Eq))
}

/// Build the `AND` condition for every criteria field the client set.
///
/// The search field becomes an `OR` over the schema's search columns and
/// nested filters contribute their own criteria. Values with no SQL
/// representation for their operator are skipped.
#[must_use]
pub fn build_condition(filter: &Filter) -> Condition {
    let constants = filter.schema().constants();
    let mut condition = Condition::all();

    for (name, value) in filter.filtering_fields() {
        if name == constants.search_field_name {
            if let Some(search) = value
                .as_str()
                .and_then(|term| build_search_condition(term, &constants.search_model_fields))
            {
                condition = condition.add(search);
            }
            continue;
        }

        if let Some(nested) = value.as_filter() {
            condition = condition.add(build_condition(nested));
            continue;
        }

        let (column, operator) = split_field_operator(name);
        match build_expression(column, operator, value) {
            Some(expression) => condition = condition.add(expression),
            None => tracing::debug!(
                field = name,
                operator = operator.suffix(),
                "Skipping criteria value with no SQL representation"
            ),
        }
    }

    condition
}

fn build_expression(
    column: &str,
    operator: FilterOperator,
    value: &FilterValue,
) -> Option<SimpleExpr> {
    let col = Expr::col(Alias::new(column));
    match operator {
        FilterOperator::Eq => to_sql_value(value).map(|v| col.eq(v)),
        FilterOperator::Neq => to_sql_value(value).map(|v| col.ne(v)),
        FilterOperator::Gt => to_sql_value(value).map(|v| col.gt(v)),
        FilterOperator::Gte => to_sql_value(value).map(|v| col.gte(v)),
        FilterOperator::Lt => to_sql_value(value).map(|v| col.lt(v)),
        FilterOperator::Lte => to_sql_value(value).map(|v| col.lte(v)),
        FilterOperator::In => value
            .as_list()
            .map(|items| col.is_in(items.iter().filter_map(to_sql_value))),
        FilterOperator::NotIn => value
            .as_list()
            .map(|items| col.is_not_in(items.iter().filter_map(to_sql_value))),
        FilterOperator::IsNull => value.as_bool().map(|is_null| {
            if is_null {
                col.is_null()
            } else {
                col.is_not_null()
            }
        }),
        FilterOperator::Like => value.as_str().map(|term| col.like(format!("%{term}%"))),
        FilterOperator::Ilike => value.as_str().map(|term| build_like_condition(column, term)),
    }
}

fn to_sql_value(value: &FilterValue) -> Option<Value> {
    match value {
        FilterValue::Bool(value) => Some((*value).into()),
        FilterValue::Int(value) => Some((*value).into()),
        FilterValue::Float(value) => Some((*value).into()),
        FilterValue::Text(value) => Some(value.as_str().into()),
        FilterValue::Uuid(value) => Some((*value).into()),
        FilterValue::Null | FilterValue::List(_) | FilterValue::Nested(_) => None,
    }
}
