//! Domain services
//!
//! Services hold the business rules: membership and authorship checks,
//! transactional boundaries, cache use and mail delivery. Handlers only
//! translate HTTP to service calls and service errors to responses.
//!
//! - `auth`: registration and login
//! - `teams`: teams, invitations and invite acceptance
//! - `tasks`: task creation, cached listing, transactional updates, history
//! - `comments`: task comments
//! - `reports`: read-only aggregations

pub mod auth;
pub mod comments;
pub mod reports;
pub mod tasks;
pub mod teams;

pub use auth::{AuthService, LoginOutcome};
pub use comments::CommentService;
pub use reports::ReportService;
pub use tasks::{NewTask, TaskListQuery, TaskService};
pub use teams::TeamService;

use teamtask_shared::auth::authorization::AuthzError;
use teamtask_shared::auth::jwt::JwtError;
use teamtask_shared::auth::password::PasswordError;
use teamtask_shared::mailer::MailerError;

/// Service error kinds
///
/// Transport-independent; [`crate::error::ApiError`] maps each kind to a
/// status code.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Missing or invalid field
    #[error("{0}")]
    BadInput(String),

    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("user with this email already exists")]
    UserExists,

    /// Caller lacks the required role, membership or authorship
    #[error("{0}")]
    Forbidden(String),

    /// Entity absent; carries the entity name
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("invite not found")]
    InviteNotFound,

    #[error("invite was issued for a different email")]
    InviteEmailMismatch,

    #[error("user is already a member of this team")]
    AlreadyMember,

    #[error("assignee is not a member of this team")]
    InvalidAssignee,

    #[error("mail delivery failed: {0}")]
    MailFailed(MailerError),

    #[error("mail delivery short-circuited by circuit breaker")]
    BreakerOpen,

    /// Uncategorized infrastructure failure
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

impl ServiceError {
    /// Whether the error is an infrastructure failure rather than a caller
    /// mistake
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            ServiceError::MailFailed(_) | ServiceError::BreakerOpen | ServiceError::Unexpected(_)
        )
    }
}

impl From<sqlx::Error> for ServiceError {
    fn from(err: sqlx::Error) -> Self {
        ServiceError::Unexpected(format!("database error: {}", err))
    }
}

impl From<PasswordError> for ServiceError {
    fn from(err: PasswordError) -> Self {
        ServiceError::Unexpected(format!("password operation failed: {}", err))
    }
}

impl From<JwtError> for ServiceError {
    fn from(err: JwtError) -> Self {
        ServiceError::Unexpected(format!("token operation failed: {}", err))
    }
}

impl From<tokio::task::JoinError> for ServiceError {
    fn from(err: tokio::task::JoinError) -> Self {
        ServiceError::Unexpected(format!("blocking task failed: {}", err))
    }
}

impl From<MailerError> for ServiceError {
    fn from(err: MailerError) -> Self {
        match err {
            MailerError::BreakerOpen => ServiceError::BreakerOpen,
            other => ServiceError::MailFailed(other),
        }
    }
}

impl From<AuthzError> for ServiceError {
    fn from(err: AuthzError) -> Self {
        match err {
            AuthzError::NotMember(_) => {
                ServiceError::Forbidden("not a member of this team".to_string())
            }
            AuthzError::InsufficientRole(_) => {
                ServiceError::Forbidden("insufficient permissions".to_string())
            }
            AuthzError::NotAuthor => {
                ServiceError::Forbidden("only the author can modify this resource".to_string())
            }
            AuthzError::Database(e) => e.into(),
        }
    }
}

/// Trims `value` and rejects it when nothing is left
pub(crate) fn require_non_blank(value: &str, field: &str) -> ServiceResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ServiceError::BadInput(format!("{} must not be empty", field)));
    }

    Ok(trimmed.to_string())
}
