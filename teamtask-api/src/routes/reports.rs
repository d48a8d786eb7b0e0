/// Report endpoints
///
/// Read-only aggregations over all teams. Any authenticated caller may read
/// them.
///
/// - `GET /api/v1/reports/team-summary`
/// - `GET /api/v1/reports/top-creators?month=YYYY-MM`
/// - `GET /api/v1/reports/invalid-assignees`

use crate::{app::AppState, error::ApiResult, extract::ApiQuery};
use axum::{extract::State, Json};
use serde::Deserialize;
use teamtask_shared::auth::middleware::AuthContext;
use teamtask_shared::models::report::{InvalidAssignee, TeamSummary, TeamTopCreators};

#[derive(Debug, Deserialize)]
pub struct TopCreatorsParams {
    #[serde(default)]
    pub month: String,
}

/// Member count and tasks completed in the last 7 days, per team
pub async fn team_summary(
    State(state): State<AppState>,
    _auth: AuthContext,
) -> ApiResult<Json<Vec<TeamSummary>>> {
    Ok(Json(state.reports.team_summary().await?))
}

/// Top three task creators per team for a calendar month
///
/// # Errors
///
/// - `400 Bad Request`: `month` missing or not `YYYY-MM`
pub async fn top_creators(
    State(state): State<AppState>,
    _auth: AuthContext,
    ApiQuery(params): ApiQuery<TopCreatorsParams>,
) -> ApiResult<Json<Vec<TeamTopCreators>>> {
    Ok(Json(state.reports.top_creators(&params.month).await?))
}

/// Tasks whose assignee is not a member of the task's team
pub async fn invalid_assignees(
    State(state): State<AppState>,
    _auth: AuthContext,
) -> ApiResult<Json<Vec<InvalidAssignee>>> {
    Ok(Json(state.reports.invalid_assignees().await?))
}
