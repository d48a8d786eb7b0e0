/// Authorization checks
///
/// Two layers, checked in this order on a request:
///
/// 1. **Route level**: [`require_any_role`] filters on the token's `role`
///    claim. The claim is the caller's highest role at login time, so this is
///    only a coarse pre-filter.
/// 2. **Per request**: [`require_membership`] and [`require_team_role`] ask
///    the database about the caller's membership in the specific team.
///    These are authoritative.
///
/// [`require_author`] covers resources only their creator may change.
///
/// # Example
///
/// ```no_run
/// use teamtask_shared::auth::authorization::{require_any_role, require_team_role};
/// use teamtask_shared::auth::middleware::AuthContext;
/// use teamtask_shared::models::team_member::TeamRole;
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// async fn can_invite(pool: &PgPool, auth: &AuthContext, team_id: Uuid) -> Result<(), Box<dyn std::error::Error>> {
///     require_any_role(auth, &[TeamRole::Owner, TeamRole::Admin])?;
///     require_team_role(pool, team_id, auth.user_id, &[TeamRole::Owner, TeamRole::Admin]).await?;
///     Ok(())
/// }
/// ```

use sqlx::PgExecutor;
use uuid::Uuid;

use super::middleware::AuthContext;
use crate::models::team_member::{TeamMember, TeamRole};

/// Error type for authorization checks
#[derive(Debug, thiserror::Error)]
pub enum AuthzError {
    #[error("not a member of team {0}")]
    NotMember(Uuid),

    /// Role not among those allowed
    #[error("insufficient role: {0}")]
    InsufficientRole(String),

    /// Caller is not the author of the resource
    #[error("not authorized to modify this resource")]
    NotAuthor,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Checks the token's role claim against an allow-list
pub fn require_any_role(auth: &AuthContext, allowed: &[TeamRole]) -> Result<(), AuthzError> {
    let permitted = auth
        .role
        .parse::<TeamRole>()
        .map(|role| allowed.contains(&role))
        .unwrap_or(false);

    if !permitted {
        return Err(AuthzError::InsufficientRole(auth.role.clone()));
    }

    Ok(())
}

/// Checks that the user belongs to the team
pub async fn require_membership<'e, E>(
    executor: E,
    team_id: Uuid,
    user_id: Uuid,
) -> Result<(), AuthzError>
where
    E: PgExecutor<'e>,
{
    if !TeamMember::is_member(executor, team_id, user_id).await? {
        return Err(AuthzError::NotMember(team_id));
    }

    Ok(())
}

/// Checks that the user's role in the team is one of `allowed`
///
/// # Returns
///
/// The user's role on success
pub async fn require_team_role<'e, E>(
    executor: E,
    team_id: Uuid,
    user_id: Uuid,
    allowed: &[TeamRole],
) -> Result<TeamRole, AuthzError>
where
    E: PgExecutor<'e>,
{
    let role = TeamMember::role_of(executor, team_id, user_id)
        .await?
        .ok_or(AuthzError::NotMember(team_id))?;

    if !allowed.contains(&role) {
        return Err(AuthzError::InsufficientRole(role.to_string()));
    }

    Ok(role)
}

/// Checks that the caller created the resource
pub fn require_author(user_id: Uuid, author_id: Uuid) -> Result<(), AuthzError> {
    if user_id != author_id {
        return Err(AuthzError::NotAuthor);
    }

    Ok(())
}
