/// Task endpoints
///
/// - `GET  /api/v1/tasks?team_id=..&status=..&assignee_id=..&page=..&per_page=..`
/// - `POST /api/v1/tasks`
/// - `PUT  /api/v1/tasks/:id`
/// - `GET  /api/v1/tasks/:id/history`

use crate::{
    app::AppState,
    error::ApiResult,
    extract::{ApiJson, ApiPath, ApiQuery},
    services::{NewTask, TaskListQuery},
};
use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Deserializer};
use teamtask_shared::auth::middleware::AuthContext;
use teamtask_shared::models::task::{Task, TaskPatch, TaskStatus};
use teamtask_shared::models::task_history::TaskHistory;
use teamtask_shared::models::Page;
use uuid::Uuid;
use validator::Validate;

/// Create task request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTaskRequest {
    pub team_id: Uuid,

    #[validate(length(max = 255, message = "Title must be at most 255 characters"))]
    pub title: String,

    pub description: Option<String>,

    /// Defaults to `todo`
    pub status: Option<TaskStatus>,

    pub assignee_id: Option<Uuid>,
}

/// Task list query string
#[derive(Debug, Deserialize)]
pub struct ListTasksParams {
    pub team_id: Uuid,
    pub status: Option<TaskStatus>,
    pub assignee_id: Option<Uuid>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// Update task request
///
/// Absent fields are left unchanged. `description` and `assignee_id` may be
/// sent as `null` to clear them.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateTaskRequest {
    #[validate(length(max = 255, message = "Title must be at most 255 characters"))]
    pub title: Option<String>,

    #[serde(default, deserialize_with = "present")]
    pub description: Option<Option<String>>,

    pub status: Option<TaskStatus>,

    #[serde(default, deserialize_with = "present")]
    pub assignee_id: Option<Option<Uuid>>,
}

impl From<UpdateTaskRequest> for TaskPatch {
    fn from(req: UpdateTaskRequest) -> Self {
        TaskPatch {
            title: req.title,
            description: req.description,
            status: req.status,
            assignee_id: req.assignee_id,
        }
    }
}

/// Marks a field as present, keeping an explicit `null` as `Some(None)`
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Create a task
///
/// # Endpoint
///
/// ```text
/// POST /api/v1/tasks
/// Authorization: Bearer <token>
///
/// {
///   "team_id": "uuid",
///   "title": "Write release notes",
///   "description": "optional",
///   "status": "todo",
///   "assignee_id": "uuid"
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Empty title, or assignee is not a team member
/// - `403 Forbidden`: Caller is not a member of the team
pub async fn create_task(
    State(state): State<AppState>,
    auth: AuthContext,
    ApiJson(req): ApiJson<CreateTaskRequest>,
) -> ApiResult<(StatusCode, Json<Task>)> {
    req.validate()?;

    let task = state
        .tasks
        .create(
            auth.user_id,
            NewTask {
                team_id: req.team_id,
                title: req.title,
                description: req.description,
                status: req.status,
                assignee_id: req.assignee_id,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(task)))
}

/// List one page of a team's tasks
///
/// Pages may be served from the tasks cache and can lag behind writes by up
/// to the cache TTL. `total` is always current.
pub async fn list_tasks(
    State(state): State<AppState>,
    auth: AuthContext,
    ApiQuery(params): ApiQuery<ListTasksParams>,
) -> ApiResult<Json<Page<Task>>> {
    let page = state
        .tasks
        .list(
            auth.user_id,
            TaskListQuery {
                team_id: params.team_id,
                status: params.status,
                assignee_id: params.assignee_id,
                page: params.page,
                per_page: params.per_page,
            },
        )
        .await?;

    Ok(Json(page))
}

/// Update a task
///
/// Only the task's creator may update it. Every successful call appends one
/// history row.
///
/// # Errors
///
/// - `400 Bad Request`: Empty title, or new assignee is not a team member
/// - `403 Forbidden`: Caller did not create the task
/// - `404 Not Found`: Task does not exist
pub async fn update_task(
    State(state): State<AppState>,
    auth: AuthContext,
    ApiPath(task_id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<UpdateTaskRequest>,
) -> ApiResult<Json<Task>> {
    req.validate()?;

    let task = state.tasks.update(auth.user_id, task_id, req.into()).await?;

    Ok(Json(task))
}

pub async fn task_history(
    State(state): State<AppState>,
    auth: AuthContext,
    ApiPath(task_id): ApiPath<Uuid>,
) -> ApiResult<Json<Vec<TaskHistory>>> {
    let history = state.tasks.history(auth.user_id, task_id).await?;
    Ok(Json(history))
}
