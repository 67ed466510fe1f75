/// Task endpoints
///
/// Every route here runs behind authentication and is scoped to the
/// calling user. A task belonging to someone else is indistinguishable
/// from a task that does not exist.
///
/// # Endpoints
///
/// - `POST /tasks` - Create a task
/// - `GET /tasks` - List own tasks with filter, sort, and pagination
/// - `GET /tasks/:id` - Read one task
/// - `PATCH /tasks/:id` - Update one task
/// - `DELETE /tasks/:id` - Delete one task
use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    middleware::AuthSession,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use taskhub_shared::models::task::{CreateTask, Task, TaskQuery, TaskSort, UpdateTask};
use uuid::Uuid;

/// Create task request
///
/// Owner is always the authenticated caller. Any owner field in the body
/// is ignored rather than rejected.
#[derive(Debug, Deserialize)]
pub struct CreateTaskRequest {
    /// Task description
    pub description: String,

    /// Completion flag, defaults to false
    pub completed: Option<bool>,
}

/// List query parameters, all optional
///
/// Values arrive as strings and unparseable ones are dropped rather than
/// rejected, so a typo in `limit` degrades to an unpaginated list.
#[derive(Debug, Default, Deserialize)]
pub struct ListTasksParams {
    /// Filter on completion: the literal string "true" selects completed
    /// tasks, any other non-empty value selects incomplete ones, and an
    /// empty value applies no filter at all
    pub completed: Option<String>,

    /// Sort spec, `field` or `field:desc`
    #[serde(rename = "sortBy")]
    pub sort_by: Option<String>,

    /// Page size
    pub limit: Option<String>,

    /// Rows to skip before the page
    pub skip: Option<String>,
}

impl ListTasksParams {
    fn into_query(self) -> TaskQuery {
        TaskQuery {
            completed: self
                .completed
                .filter(|value| !value.is_empty())
                .map(|value| value == "true"),
            sort: self.sort_by.as_deref().map(TaskSort::parse),
            limit: self.limit.and_then(|v| v.parse().ok()).filter(|n| *n >= 0),
            skip: self.skip.and_then(|v| v.parse().ok()).filter(|n| *n >= 0),
        }
    }
}

/// Fields a PATCH /tasks/:id body may contain.
const TASK_UPDATE_FIELDS: &[&str] = &["description", "completed"];

/// Create a task owned by the caller
///
/// # Errors
///
/// - `400 Bad Request`: Empty description
/// - `500 Internal Server Error`: Server error
pub async fn create_task(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
    Json(req): Json<CreateTaskRequest>,
) -> ApiResult<(StatusCode, Json<Task>)> {
    let description = req.description.trim().to_string();
    if description.is_empty() {
        return Err(ApiError::validation(
            "description",
            "Description is required.",
        ));
    }

    let task = Task::create(
        &state.db,
        CreateTask {
            description,
            completed: req.completed.unwrap_or(false),
            owner_id: session.user.id,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(task)))
}

/// List the caller's tasks
///
/// Supports `completed`, `sortBy`, `limit`, and `skip` query parameters.
pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
    Query(params): Query<ListTasksParams>,
) -> ApiResult<Json<Vec<Task>>> {
    let tasks = Task::list_by_owner(&state.db, session.user.id, params.into_query()).await?;
    Ok(Json(tasks))
}

/// Read one task by id
///
/// # Errors
///
/// - `404 Not Found`: No such task, or the task belongs to someone else
pub async fn get_task(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
    Path(task_id): Path<Uuid>,
) -> ApiResult<Json<Task>> {
    let task = Task::find_by_id_and_owner(&state.db, task_id, session.user.id)
        .await?
        .ok_or(ApiError::NotFound)?;

    Ok(Json(task))
}

/// Update one task by id
///
/// The body must contain only keys from the allow-list.
///
/// # Errors
///
/// - `400 Bad Request`: Unknown key or empty description
/// - `404 Not Found`: No such task, or the task belongs to someone else
pub async fn update_task(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
    Path(task_id): Path<Uuid>,
    Json(body): Json<serde_json::Value>,
) -> ApiResult<Json<Task>> {
    let object = body.as_object().ok_or(ApiError::InvalidUpdate)?;
    if object
        .keys()
        .any(|key| !TASK_UPDATE_FIELDS.contains(&key.as_str()))
    {
        return Err(ApiError::InvalidUpdate);
    }

    let mut update: UpdateTask =
        serde_json::from_value(body).map_err(|_| ApiError::InvalidUpdate)?;

    if let Some(description) = update.description.as_mut() {
        *description = description.trim().to_string();
        if description.is_empty() {
            return Err(ApiError::validation(
                "description",
                "Description is required.",
            ));
        }
    }

    let task = Task::update(&state.db, task_id, session.user.id, update)
        .await?
        .ok_or(ApiError::NotFound)?;

    Ok(Json(task))
}

/// Delete one task by id
///
/// Returns the deleted task.
///
/// # Errors
///
/// - `404 Not Found`: No such task, or the task belongs to someone else
pub async fn delete_task(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
    Path(task_id): Path<Uuid>,
) -> ApiResult<Json<Task>> {
    let task = Task::delete(&state.db, task_id, session.user.id)
        .await?
        .ok_or(ApiError::NotFound)?;

    Ok(Json(task))
}
