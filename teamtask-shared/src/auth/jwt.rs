/// JWT access tokens
///
/// Tokens are compact JWS signed with HS256 using a process-wide secret and
/// carry four claims:
///
/// - `sub`: user id
/// - `role`: the user's highest team role at login time (`owner`, `admin` or `member`)
/// - `iat`: issued-at (Unix seconds)
/// - `exp`: expiry (Unix seconds)
///
/// The `role` claim is a coarse route-level filter only. Team-specific
/// decisions go through the membership queries in [`crate::auth::authorization`].
///
/// # Example
///
/// ```
/// use teamtask_shared::auth::jwt::{create_token, default_access_ttl, validate_token, Claims};
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let user_id = Uuid::new_v4();
/// let secret = "0123456789abcdef0123456789abcdef";
///
/// let claims = Claims::new(user_id, "member", default_access_ttl());
/// let token = create_token(&claims, secret)?;
///
/// let validated = validate_token(&token, secret)?;
/// assert_eq!(validated.sub, user_id);
/// assert_eq!(validated.role, "member");
/// # Ok(())
/// # }
/// ```

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Access token lifetime in minutes used when none is configured
pub const DEFAULT_ACCESS_TTL_MINUTES: i64 = 30;

/// Default access token lifetime
pub fn default_access_ttl() -> Duration {
    Duration::minutes(DEFAULT_ACCESS_TTL_MINUTES)
}

/// Error type for JWT operations
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    #[error("failed to create token: {0}")]
    Create(String),

    /// Bad signature, wrong algorithm, malformed token or missing claims
    #[error("invalid token: {0}")]
    Invalid(String),

    #[error("token has expired")]
    Expired,
}

/// Access token claims
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: Uuid,

    /// Highest team role at login time
    pub role: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    /// Creates claims issued now and expiring after `ttl`
    pub fn new(user_id: Uuid, role: impl Into<String>, ttl: Duration) -> Self {
        let now = Utc::now();

        Self {
            sub: user_id,
            role: role.into(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.exp
    }
}

/// Normalizes a configured TTL in minutes
///
/// Zero or negative values fall back to [`DEFAULT_ACCESS_TTL_MINUTES`].
pub fn access_ttl_from_minutes(minutes: i64) -> Duration {
    if minutes <= 0 {
        default_access_ttl()
    } else {
        Duration::minutes(minutes)
    }
}

/// Signs claims with HS256
///
/// # Errors
///
/// Returns `JwtError::Create` if encoding fails
pub fn create_token(claims: &Claims, secret: &str) -> Result<String, JwtError> {
    let header = Header::new(Algorithm::HS256);
    let key = EncodingKey::from_secret(secret.as_bytes());

    encode(&header, claims, &key).map_err(|e| JwtError::Create(e.to_string()))
}

/// Validates an HS256 token and extracts its claims
///
/// Rejects tokens signed with any other algorithm, tokens whose signature
/// does not match `secret`, and tokens past `exp`.
pub fn validate_token(token: &str, secret: &str) -> Result<Claims, JwtError> {
    let key = DecodingKey::from_secret(secret.as_bytes());

    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;
    validation.validate_exp = true;
    validation.set_required_spec_claims(&["exp", "sub"]);

    let data = decode::<Claims>(token, &key, &validation).map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
        _ => JwtError::Invalid(e.to_string()),
    })?;

    Ok(data.claims)
}
