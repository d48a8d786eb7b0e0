/// Authentication endpoints
///
/// # Endpoints
///
/// - `POST /api/v1/register` - Register new user
/// - `POST /api/v1/login` - Login and get an access token
///
/// Both are public: a bearer token, if sent, is ignored.

use crate::{
    app::AppState,
    error::ApiResult,
    extract::ApiJson,
};
use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use teamtask_shared::models::user::User;
use validator::Validate;

use crate::services::LoginOutcome;

/// Register request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(max = 255, message = "Email must be at most 255 characters"))]
    pub email: String,

    #[validate(length(max = 128, message = "Password must be at most 128 characters"))]
    pub password: String,
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(max = 255, message = "Email must be at most 255 characters"))]
    pub email: String,

    #[validate(length(max = 128, message = "Password must be at most 128 characters"))]
    pub password: String,
}

/// Register a new user
///
/// # Endpoint
///
/// ```text
/// POST /api/v1/register
/// Content-Type: application/json
///
/// {
///   "email": "user@example.com",
///   "password": "secret123"
/// }
/// ```
///
/// # Response
///
/// `201 Created` with the user (`id`, `email`, `created_at`, `updated_at`).
///
/// # Errors
///
/// - `400 Bad Request`: Empty or oversized fields, or email already registered
/// - `500 Internal Server Error`: Welcome mail failed (the account exists)
pub async fn register(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<User>)> {
    req.validate()?;

    let user = state.auth.register(&req.email, &req.password).await?;

    Ok((StatusCode::CREATED, Json(user)))
}

/// Login with email and password
///
/// # Endpoint
///
/// ```text
/// POST /api/v1/login
/// Content-Type: application/json
///
/// {
///   "email": "user@example.com",
///   "password": "secret123"
/// }
/// ```
///
/// # Response
///
/// ```json
/// {
///   "token": "eyJ...",
///   "user": { "id": "uuid", "email": "user@example.com", ... }
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Empty or oversized fields
/// - `401 Unauthorized`: Unknown email or wrong password
pub async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> ApiResult<Json<LoginOutcome>> {
    req.validate()?;

    let outcome = state.auth.login(&req.email, &req.password).await?;

    Ok(Json(outcome))
}
