/// Team endpoints
///
/// - `GET  /api/v1/teams` - Teams the caller belongs to
/// - `POST /api/v1/teams` - Create a team; the caller becomes its owner
/// - `POST /api/v1/teams/:id/invite` - Invite an email address (owner or admin)
/// - `POST /api/v1/teams/invites/accept` - Redeem an invite code

use crate::{
    app::AppState,
    error::ApiResult,
    extract::{ApiJson, ApiPath},
};
use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use teamtask_shared::auth::middleware::AuthContext;
use teamtask_shared::models::team::Team;
use teamtask_shared::models::team_invite::TeamInvite;
use teamtask_shared::models::team_member::TeamMember;
use uuid::Uuid;
use validator::Validate;

/// Create team request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTeamRequest {
    #[validate(length(max = 255, message = "Name must be at most 255 characters"))]
    pub name: String,
}

/// Invite request
#[derive(Debug, Deserialize, Validate)]
pub struct InviteRequest {
    #[validate(length(max = 255, message = "Email must be at most 255 characters"))]
    pub email: String,
}

/// Accept invite request
#[derive(Debug, Deserialize)]
pub struct AcceptInviteRequest {
    pub code: String,
}

pub async fn list_teams(
    State(state): State<AppState>,
    auth: AuthContext,
) -> ApiResult<Json<Vec<Team>>> {
    let teams = state.teams.list(auth.user_id).await?;
    Ok(Json(teams))
}

/// Create a team
///
/// # Errors
///
/// - `400 Bad Request`: Empty or oversized name
pub async fn create_team(
    State(state): State<AppState>,
    auth: AuthContext,
    ApiJson(req): ApiJson<CreateTeamRequest>,
) -> ApiResult<(StatusCode, Json<Team>)> {
    req.validate()?;

    let team = state.teams.create(auth.user_id, &req.name).await?;

    Ok((StatusCode::CREATED, Json(team)))
}

/// Invite an email address to a team
///
/// # Endpoint
///
/// ```text
/// POST /api/v1/teams/{id}/invite
/// Authorization: Bearer <token>
///
/// { "email": "new@example.com" }
/// ```
///
/// # Response
///
/// `201 Created` with the invite, including its `code`.
///
/// # Errors
///
/// - `400 Bad Request`: Empty email, or the address already belongs to a member
/// - `403 Forbidden`: Caller is not an owner or admin of the team
/// - `404 Not Found`: Team does not exist
/// - `500 Internal Server Error`: Invitation mail failed or mailer breaker open
pub async fn invite(
    State(state): State<AppState>,
    auth: AuthContext,
    ApiPath(team_id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<InviteRequest>,
) -> ApiResult<(StatusCode, Json<TeamInvite>)> {
    req.validate()?;

    let invite = state.teams.invite(auth.user_id, team_id, &req.email).await?;

    Ok((StatusCode::CREATED, Json(invite)))
}

/// Redeem an invite code
///
/// # Errors
///
/// - `400 Bad Request`: Caller already a member
/// - `403 Forbidden`: Invite was issued to a different email
/// - `404 Not Found`: Blank, malformed, unknown or already redeemed code
pub async fn accept_invite(
    State(state): State<AppState>,
    auth: AuthContext,
    ApiJson(req): ApiJson<AcceptInviteRequest>,
) -> ApiResult<Json<TeamMember>> {
    let member = state.teams.accept(auth.user_id, &req.code).await?;
    Ok(Json(member))
}
