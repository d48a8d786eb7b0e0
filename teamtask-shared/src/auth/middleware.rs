/// Bearer token authentication for Axum
///
/// Two entry points share the same token check:
///
/// - [`jwt_auth_middleware`] (strict): a missing or invalid token ends the
///   request with 401.
/// - [`optional_jwt_auth_middleware`]: a missing or invalid token is ignored
///   and the request proceeds without an identity.
///
/// On success an [`AuthContext`] is inserted into the request extensions.
/// Handlers take it as an extractor; extracting it on a request that was
/// never authenticated yields 401.
///
/// # Example
///
/// ```no_run
/// use axum::{extract::Request, middleware::{self, Next}, routing::get, Router};
/// use teamtask_shared::auth::middleware::{jwt_auth_middleware, AuthContext};
///
/// async fn whoami(auth: AuthContext) -> String {
///     format!("{} ({})", auth.user_id, auth.role)
/// }
///
/// let secret = "0123456789abcdef0123456789abcdef".to_string();
/// let app: Router = Router::new()
///     .route("/whoami", get(whoami))
///     .layer(middleware::from_fn(move |req: Request, next: Next| {
///         jwt_auth_middleware(secret.clone(), req, next)
///     }));
/// ```

use axum::{
    async_trait,
    extract::{FromRequestParts, Request},
    http::{header, request::Parts, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::jwt::{validate_token, JwtError};

/// Identity of the caller, taken from a validated token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContext {
    pub user_id: Uuid,

    /// Role claim as issued at login
    pub role: String,
}

/// Identity that may be absent, for routes behind the optional middleware
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaybeAuth(pub Option<AuthContext>);

/// Authentication failure
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("missing authorization header")]
    MissingCredentials,

    #[error("expected bearer token")]
    InvalidFormat,

    #[error("invalid token")]
    InvalidToken,

    #[error("token expired")]
    Expired,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({
            "error": "unauthorized",
            "message": self.to_string(),
        });

        (StatusCode::UNAUTHORIZED, Json(body)).into_response()
    }
}

impl From<JwtError> for AuthError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::Expired => AuthError::Expired,
            _ => AuthError::InvalidToken,
        }
    }
}

/// Extracts the token from an `Authorization: Bearer <token>` header
///
/// The scheme is matched case-insensitively.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingCredentials)?
        .to_str()
        .map_err(|_| AuthError::InvalidFormat)?;

    let (scheme, token) = value.split_once(' ').ok_or(AuthError::InvalidFormat)?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AuthError::InvalidFormat);
    }

    let token = token.trim();
    if token.is_empty() {
        return Err(AuthError::InvalidFormat);
    }

    Ok(token)
}

/// Validates the bearer token in `headers`
pub fn authenticate(headers: &HeaderMap, secret: &str) -> Result<AuthContext, AuthError> {
    let token = bearer_token(headers)?;
    let claims = validate_token(token, secret)?;

    Ok(AuthContext {
        user_id: claims.sub,
        role: claims.role,
    })
}

/// Strict JWT middleware
///
/// # Errors
///
/// Responds 401 when the header is missing, not a bearer token, or the token
/// fails validation.
pub async fn jwt_auth_middleware(
    secret: String,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let auth = authenticate(req.headers(), &secret).map_err(|e| {
        tracing::debug!(error = %e, "rejected request without valid token");
        e
    })?;

    req.extensions_mut().insert(auth);

    Ok(next.run(req).await)
}

/// Optional JWT middleware
///
/// Never rejects; inserts an [`AuthContext`] only when the token is valid.
pub async fn optional_jwt_auth_middleware(secret: String, mut req: Request, next: Next) -> Response {
    if let Ok(auth) = authenticate(req.headers(), &secret) {
        req.extensions_mut().insert(auth);
    }

    next.run(req).await
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .ok_or(AuthError::MissingCredentials)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for MaybeAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeAuth(parts.extensions.get::<AuthContext>().cloned()))
    }
}
