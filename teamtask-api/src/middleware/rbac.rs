/// Route-level role gating
///
/// A coarse pre-filter on the token's `role` claim, which is the caller's
/// highest role at login time. Team-specific decisions are made again by the
/// services against current membership, so passing this gate never grants
/// anything on its own.
///
/// ```text
/// POST /api/v1/teams/:id/invite   owner | admin
/// POST /api/v1/tasks              owner | admin | member
/// ```
///
/// Runs after the JWT middleware; a request without an [`AuthContext`] is
/// rejected with 401.

use axum::{extract::Request, middleware::Next, response::Response};
use teamtask_shared::auth::authorization::require_any_role;
use teamtask_shared::auth::middleware::AuthContext;
use teamtask_shared::models::team_member::TeamRole;

use crate::error::ApiError;

/// Roles allowed to invite
pub const INVITE_ROLES: &[TeamRole] = &[TeamRole::Owner, TeamRole::Admin];

/// Roles allowed to create tasks
pub const TASK_CREATE_ROLES: &[TeamRole] = &[TeamRole::Owner, TeamRole::Admin, TeamRole::Member];

/// Rejects the request unless the token's role is in `allowed`
pub async fn require_roles(
    allowed: &'static [TeamRole],
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth = req
        .extensions()
        .get::<AuthContext>()
        .ok_or_else(|| ApiError::Unauthorized("Missing credentials".to_string()))?;

    if require_any_role(auth, allowed).is_err() {
        tracing::debug!(user_id = %auth.user_id, role = %auth.role, "rejected by role gate");
        return Err(ApiError::Forbidden("insufficient permissions".to_string()));
    }

    Ok(next.run(req).await)
}

/// Gate for `POST /teams/:id/invite`
pub async fn require_inviter(req: Request, next: Next) -> Result<Response, ApiError> {
    require_roles(INVITE_ROLES, req, next).await
}

/// Gate for `POST /tasks`
pub async fn require_task_creator(req: Request, next: Next) -> Result<Response, ApiError> {
    require_roles(TASK_CREATE_ROLES, req, next).await
}
