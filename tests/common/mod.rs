#![allow(dead_code)]

use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};
use filtercrate::{
    ApiError, FieldSpec, FieldType, FilterDepends, FilterSchema, ModelDescriptor, SeaOrmBackend,
    with_prefix,
};
use sea_orm::{
    ActiveValue::Set, ConnectionTrait, Database, DatabaseConnection, DbErr, EntityTrait, Schema,
};
use std::sync::Arc;
use uuid::Uuid;

pub mod todo_entity;

/// Criteria over the `todos` table, ordering on any column
pub fn todo_filter() -> Arc<FilterSchema> {
    FilterSchema::builder("TodoFilter", ModelDescriptor::from_entity::<todo_entity::Entity>())
        .field(FieldSpec::optional("title", FieldType::Text))
        .field(FieldSpec::optional("title__in", FieldType::list(FieldType::Text)))
        .field(FieldSpec::optional("title__ilike", FieldType::Text))
        .field(FieldSpec::optional("priority__gte", FieldType::Integer))
        .field(FieldSpec::optional("priority__lt", FieldType::Integer))
        .field(FieldSpec::optional("priority__not_in", FieldType::list(FieldType::Integer)))
        .field(FieldSpec::optional("completed", FieldType::Boolean))
        .field(FieldSpec::optional("due_date__isnull", FieldType::Boolean))
        .field(FieldSpec::optional("search", FieldType::Text))
        .field(FieldSpec::optional("order_by", FieldType::list(FieldType::Text)))
        .search_model_fields(["title"])
        .build()
}

/// A count criterion plus ordering over a two-column model
pub fn count_filter() -> Arc<FilterSchema> {
    FilterSchema::builder("CountFilter", ModelDescriptor::new("counters", ["count", "created_at"]))
        .field(FieldSpec::optional("count", FieldType::Integer))
        .field(FieldSpec::optional("order_by", FieldType::list(FieldType::Text)))
        .build()
}

/// `todo_filter` embedded under the `todo` prefix next to its own criteria
pub fn outer_filter() -> Arc<FilterSchema> {
    let (_, nested) = with_prefix("todo", &todo_filter());
    FilterSchema::builder("ProjectFilter", ModelDescriptor::from_entity::<todo_entity::Entity>())
        .field(FieldSpec::optional("completed", FieldType::Boolean))
        .field(FieldSpec::optional("todo", nested.into()))
        .build()
}

pub async fn setup_test_db() -> Result<DatabaseConnection, DbErr> {
    let db = Database::connect("sqlite::memory:").await?;

    let backend = db.get_database_backend();
    let schema = Schema::new(backend);
    db.execute(backend.build(&schema.create_table_from_entity(todo_entity::Entity)))
        .await?;

    Ok(db)
}

pub async fn seed_todos(db: &DatabaseConnection) -> Result<(), DbErr> {
    let rows = [
        ("Write report", 5, false, Some("2024-06-01")),
        ("Review report", 3, true, None),
        ("Plan sprint", 8, false, Some("2024-05-20")),
        ("Fix login bug", 9, false, None),
        ("Water plants", 1, true, None),
    ];
    let models = rows.map(|(title, priority, completed, due_date)| todo_entity::ActiveModel {
        id: Set(Uuid::new_v4()),
        title: Set(title.to_string()),
        priority: Set(priority),
        completed: Set(completed),
        due_date: Set(due_date.map(ToString::to_string)),
    });
    todo_entity::Entity::insert_many(models).exec(db).await?;
    Ok(())
}

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub todo_filter: FilterDepends,
}

async fn list_todos(
    State(state): State<AppState>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Json<Vec<todo_entity::Model>>, ApiError> {
    let bound = state.todo_filter.bind(params)?;
    let query = bound.filter(&SeaOrmBackend, todo_entity::Entity::find())?;
    let query = bound.sort(&SeaOrmBackend, query)?;
    Ok(Json(query.all(&state.db).await?))
}

pub fn setup_test_app(db: DatabaseConnection) -> Router {
    let state = AppState {
        db,
        todo_filter: FilterDepends::new(&todo_filter()),
    };

    let api = Router::new()
        .route("/todos", get(list_todos))
        .with_state(state);

    Router::new().nest("/api/v1", api)
}
