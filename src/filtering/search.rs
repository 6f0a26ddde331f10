use sea_orm::{
    Condition,
    sea_query::{Alias, Expr, Func, LikeExpr, SimpleExpr},
};

// Basic safety limits
const MAX_SEARCH_TERM_LENGTH: usize = 1_000;

/// Escape LIKE wildcards so the term is matched literally
fn escape_like_wildcards(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Build `UPPER(column) LIKE '%TERM%'`, a case-insensitive substring match
#[must_use]
pub fn build_like_condition(column: &str, term: &str) -> SimpleExpr {
    let pattern = format!("%{}%", escape_like_wildcards(term).to_uppercase());
    Expr::expr(Func::upper(Expr::col(Alias::new(column)))).like(LikeExpr::new(pattern).escape('\\'))
}

/// Match `term` against any of `columns`.
///
/// Returns `None` for a blank term or when the schema declares no search
/// columns; overly long terms are truncated.
#[must_use]
pub fn build_search_condition(term: &str, columns: &[String]) -> Option<Condition> {
    let term = term.trim();
    if term.is_empty() || columns.is_empty() {
        return None;
    }
    let term: String = term.chars().take(MAX_SEARCH_TERM_LENGTH).collect();

    Some(
        columns
            .iter()
            .fold(Condition::any(), |condition, column| {
                condition.add(build_like_condition(column, &term))
            }),
    )
}
