use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{json_body, parse_id, AppState};
use crate::domain::{parse_completed, CreatedTodo, NewTodo, Todo};
use crate::error::AppError;

#[derive(Debug, Default, Deserialize)]
pub struct CreateTodoRequest {
    pub task: Option<String>,
}

/// `completed` is kept as raw JSON and normalized by [`parse_completed`].
#[derive(Debug, Default, Deserialize)]
pub struct UpdateTodoRequest {
    pub completed: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

pub async fn list_todos(State(state): State<AppState>) -> Result<Json<Vec<Todo>>, AppError> {
    let todos = state
        .store
        .list_todos()
        .await
        .map_err(AppError::store("Failed to fetch todos"))?;

    Ok(Json(todos))
}

pub async fn create_todo(
    State(state): State<AppState>,
    payload: Result<Json<CreateTodoRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreatedTodo>), AppError> {
    let request = json_body(payload)?;
    let new_todo = NewTodo::from_task(request.task)
        .ok_or_else(|| AppError::BadRequest("Task content is required".into()))?;

    let result = state
        .store
        .insert_todo(&new_todo)
        .await
        .map_err(AppError::store("Failed to create todo"))?;

    let id = result
        .insert_id
        .ok_or_else(|| AppError::Internal("Failed to create todo: no id assigned".into()))?;

    Ok((StatusCode::CREATED, Json(CreatedTodo::new(id, new_todo))))
}

/// Set `completed`, then re-read the row. The two statements are independent;
/// a concurrent delete between them surfaces as a 500.
pub async fn update_todo(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateTodoRequest>, JsonRejection>,
) -> Result<Json<Todo>, AppError> {
    let request = json_body(payload)?;
    let id = parse_id(&id).ok_or_else(AppError::todo_not_found)?;
    let completed = parse_completed(request.completed.as_ref());
    tracing::debug!(id, completed, "Updating todo");

    let result = state
        .store
        .set_todo_completed(id, completed)
        .await
        .map_err(AppError::store("Failed to update todo"))?;
    if result.matched_nothing() {
        return Err(AppError::todo_not_found());
    }

    let todo = state
        .store
        .find_todo(id)
        .await
        .map_err(AppError::store("Failed to update todo"))?
        .ok_or_else(|| AppError::Internal("Failed to retrieve updated todo".into()))?;

    Ok(Json(todo))
}

pub async fn delete_todo(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let id = parse_id(&id).ok_or_else(AppError::todo_not_found)?;

    let result = state
        .store
        .delete_todo(id)
        .await
        .map_err(AppError::store("Failed to delete todo"))?;
    if result.matched_nothing() {
        return Err(AppError::todo_not_found());
    }

    Ok(Json(MessageResponse {
        message: "Todo deleted successfully".to_string(),
    }))
}
