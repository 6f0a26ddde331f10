mod common;

use common::{outer_filter, seed_todos, setup_test_db, todo_entity, todo_filter};
use filtercrate::{Filter, SeaOrmBackend};
use sea_orm::{DbBackend, EntityTrait, QueryTrait};
use serde_json::{Map, Value, json};

fn mapping(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => unreachable!("test input must be an object"),
    }
}

fn filtered_sql(filter: &Filter) -> String {
    let query = filter.filter(&SeaOrmBackend, todo_entity::Entity::find()).unwrap();
    let query = filter.sort(&SeaOrmBackend, query).unwrap();
    query.build(DbBackend::Sqlite).to_string()
}

#[test]
fn test_comparison_operators() {
    let filter = Filter::from_mapping(
        &todo_filter(),
        &mapping(json!({"priority__gte": "3", "priority__lt": 9, "title": "Plan sprint"})),
    )
    .unwrap();
    let sql = filtered_sql(&filter);

    assert!(sql.contains(r#""title" = 'Plan sprint'"#), "got: {sql}");
    assert!(sql.contains(r#""priority" >= 3"#), "got: {sql}");
    assert!(sql.contains(r#""priority" < 9"#), "got: {sql}");
    assert!(!sql.contains("ORDER BY"), "got: {sql}");
}

#[test]
fn test_list_operators() {
    let filter = Filter::from_mapping(
        &todo_filter(),
        &mapping(json!({"title__in": "a,b", "priority__not_in": [1, 2]})),
    )
    .unwrap();
    let sql = filtered_sql(&filter);

    assert!(sql.contains(r#""title" IN ('a', 'b')"#), "got: {sql}");
    assert!(sql.contains(r#""priority" NOT IN (1, 2)"#), "got: {sql}");
}

#[test]
fn test_isnull_and_ilike() {
    let filter = Filter::from_mapping(
        &todo_filter(),
        &mapping(json!({"due_date__isnull": "true", "title__ilike": "Report"})),
    )
    .unwrap();
    let sql = filtered_sql(&filter);

    assert!(sql.contains(r#""due_date" IS NULL"#), "got: {sql}");
    assert!(sql.contains(r#"UPPER("title") LIKE '%REPORT%'"#), "got: {sql}");
}

#[test]
fn test_search_spans_search_columns() {
    let filter =
        Filter::from_mapping(&todo_filter(), &mapping(json!({"search": "plan"}))).unwrap();
    let sql = filtered_sql(&filter);
    assert!(sql.contains(r#"UPPER("title") LIKE '%PLAN%'"#), "got: {sql}");
}

#[test]
fn test_ordering_in_token_order() {
    let filter = Filter::from_mapping(
        &todo_filter(),
        &mapping(json!({"order_by": "-priority,title"})),
    )
    .unwrap();
    let sql = filtered_sql(&filter);
    assert!(sql.ends_with(r#"ORDER BY "priority" DESC, "title" ASC"#), "got: {sql}");
}

#[test]
fn test_unset_and_null_criteria_are_ignored() {
    let filter =
        Filter::from_mapping(&todo_filter(), &mapping(json!({"title": null}))).unwrap();
    let sql = filtered_sql(&filter);
    assert!(!sql.contains("WHERE"), "got: {sql}");
}

#[test]
fn test_nested_criteria_are_combined() {
    let filter = Filter::from_mapping(
        &outer_filter(),
        &mapping(json!({"completed": false, "todo": {"todo__priority__gte": 4}})),
    )
    .unwrap();
    let query = filter.filter(&SeaOrmBackend, todo_entity::Entity::find()).unwrap();
    let sql = query.build(DbBackend::Sqlite).to_string();

    assert!(sql.contains(r#""completed" = "#), "got: {sql}");
    assert!(sql.contains(r#""priority" >= 4"#), "got: {sql}");
}

#[tokio::test]
async fn test_filter_and_sort_against_sqlite() {
    let db = setup_test_db().await.unwrap();
    seed_todos(&db).await.unwrap();

    let filter = Filter::from_mapping(
        &todo_filter(),
        &mapping(json!({"completed": "false", "order_by": "-priority"})),
    )
    .unwrap();
    let query = filter.filter(&SeaOrmBackend, todo_entity::Entity::find()).unwrap();
    let todos = filter.sort(&SeaOrmBackend, query).unwrap().all(&db).await.unwrap();

    let titles: Vec<_> = todos.iter().map(|todo| todo.title.as_str()).collect();
    assert_eq!(titles, vec!["Fix login bug", "Plan sprint", "Write report"]);
}

#[tokio::test]
async fn test_search_is_case_insensitive_against_sqlite() {
    let db = setup_test_db().await.unwrap();
    seed_todos(&db).await.unwrap();

    let filter = Filter::from_mapping(
        &todo_filter(),
        &mapping(json!({"search": "REPORT", "order_by": "title"})),
    )
    .unwrap();
    let query = filter.filter(&SeaOrmBackend, todo_entity::Entity::find()).unwrap();
    let todos = filter.sort(&SeaOrmBackend, query).unwrap().all(&db).await.unwrap();

    let titles: Vec<_> = todos.iter().map(|todo| todo.title.as_str()).collect();
    assert_eq!(titles, vec!["Review report", "Write report"]);
}
