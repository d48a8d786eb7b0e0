/// Task comment endpoints
///
/// - `GET    /api/v1/tasks/:id/comments?page=..&per_page=..`
/// - `POST   /api/v1/tasks/:id/comments`
/// - `PUT    /api/v1/tasks/:id/comments/:comment_id` (author only)
/// - `DELETE /api/v1/tasks/:id/comments/:comment_id` (author only)
///
/// All of them require membership in the task's team.

use crate::{
    app::AppState,
    error::ApiResult,
    extract::{ApiJson, ApiPath, ApiQuery},
};
use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use teamtask_shared::auth::middleware::AuthContext;
use teamtask_shared::models::comment::Comment;
use teamtask_shared::models::Page;
use uuid::Uuid;
use validator::Validate;

/// Comment body, used for create and update
#[derive(Debug, Deserialize, Validate)]
pub struct CommentRequest {
    #[validate(length(max = 10000, message = "Body must be at most 10000 characters"))]
    pub body: String,
}

#[derive(Debug, Deserialize)]
pub struct ListCommentsParams {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

pub async fn list_comments(
    State(state): State<AppState>,
    auth: AuthContext,
    ApiPath(task_id): ApiPath<Uuid>,
    ApiQuery(params): ApiQuery<ListCommentsParams>,
) -> ApiResult<Json<Page<Comment>>> {
    let page = state
        .comments
        .list(auth.user_id, task_id, params.page, params.per_page)
        .await?;

    Ok(Json(page))
}

pub async fn create_comment(
    State(state): State<AppState>,
    auth: AuthContext,
    ApiPath(task_id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<CommentRequest>,
) -> ApiResult<(StatusCode, Json<Comment>)> {
    req.validate()?;

    let comment = state.comments.create(auth.user_id, task_id, &req.body).await?;

    Ok((StatusCode::CREATED, Json(comment)))
}

pub async fn update_comment(
    State(state): State<AppState>,
    auth: AuthContext,
    ApiPath((task_id, comment_id)): ApiPath<(Uuid, Uuid)>,
    ApiJson(req): ApiJson<CommentRequest>,
) -> ApiResult<Json<Comment>> {
    req.validate()?;

    let comment = state
        .comments
        .update(auth.user_id, task_id, comment_id, &req.body)
        .await?;

    Ok(Json(comment))
}

/// Delete a comment
///
/// Returns `204 No Content`.
pub async fn delete_comment(
    State(state): State<AppState>,
    auth: AuthContext,
    ApiPath((task_id, comment_id)): ApiPath<(Uuid, Uuid)>,
) -> ApiResult<StatusCode> {
    state.comments.delete(auth.user_id, task_id, comment_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
