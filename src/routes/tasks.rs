//! Task endpoints. The whole scope sits behind `AuthMiddleware`, and every
//! handler goes through [`AppState::tasks_of`] so it only ever sees the
//! caller's own tasks.

use crate::{
    auth::{AuthenticatedUser, MessageResponse},
    error::AppError,
    models::{TaskInput, TaskQuery},
    state::AppState,
};
use actix_web::{delete, get, patch, post, web, HttpResponse, Responder};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Retrieves the caller's tasks, oldest first.
///
/// ## Query Parameters:
/// - `completed` (optional): `true` or `false`; anything else is a `400`.
#[get("")]
pub async fn get_tasks(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    query: web::Query<TaskQuery>,
) -> Result<impl Responder, AppError> {
    let tasks = state.tasks_of(&user.0).list(&query).await?;
    Ok(HttpResponse::Ok().json(tasks))
}

/// Creates a new task owned by the caller.
///
/// ## Request Body:
/// - `title`: required, not blank.
/// - `description`: required, not blank.
/// - `completed` (optional): boolean, defaults to `false`.
///
/// An `owner` key in the body is ignored.
///
/// ## Responses:
/// - `201 Created`: the stored task.
/// - `400 Bad Request`: validation failure.
#[post("")]
pub async fn create_task(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    body: web::Json<TaskInput>,
) -> Result<impl Responder, AppError> {
    let task = state.tasks_of(&user.0).create(body.into_inner()).await?;
    Ok(HttpResponse::Created().json(task))
}

#[get("/{id}")]
pub async fn get_task(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    id: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    let task = state.tasks_of(&user.0).get(id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(task))
}

/// Updates `title`, `description` and/or `completed`.
///
/// A body naming any other field is rejected as a whole with
/// `400 {"error": "Invalid updates!"}` and nothing is changed.
#[patch("/{id}")]
pub async fn update_task(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    id: web::Path<Uuid>,
    body: web::Json<Map<String, Value>>,
) -> Result<impl Responder, AppError> {
    let task = state
        .tasks_of(&user.0)
        .update(id.into_inner(), body.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(task))
}

#[delete("/{id}")]
pub async fn delete_task(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    id: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    state.tasks_of(&user.0).delete(id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(MessageResponse::new("Task deleted successfully.")))
}
