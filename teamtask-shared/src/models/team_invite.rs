/// Team invitation model and database operations
///
/// # Schema
///
/// ```sql
/// CREATE TABLE team_invites (
///     id UUID PRIMARY KEY,
///     team_id UUID NOT NULL REFERENCES teams(id) ON DELETE CASCADE,
///     email VARCHAR(255) NOT NULL,
///     inviter_id UUID NOT NULL REFERENCES users(id),
///     code VARCHAR(64) NOT NULL UNIQUE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// The email is a plain string: invitations to addresses that have not
/// registered yet are valid. Invites do not expire; accepting one deletes it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;
use uuid::Uuid;

/// Pending invitation row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct TeamInvite {
    pub id: Uuid,
    pub team_id: Uuid,
    pub email: String,
    pub inviter_id: Uuid,
    pub code: String,
    pub created_at: DateTime<Utc>,
}

/// Input for creating an invitation
#[derive(Debug, Clone)]
pub struct CreateTeamInvite {
    pub team_id: Uuid,
    pub email: String,
    pub inviter_id: Uuid,
    pub code: String,
}

impl TeamInvite {
    /// Persists an invitation with a fresh id
    pub async fn create<'e, E>(executor: E, data: CreateTeamInvite) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, TeamInvite>(
            r#"
            INSERT INTO team_invites (id, team_id, email, inviter_id, code, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, team_id, email, inviter_id, code, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(data.team_id)
        .bind(&data.email)
        .bind(data.inviter_id)
        .bind(&data.code)
        .bind(Utc::now())
        .fetch_one(executor)
        .await
    }

    /// Looks an invitation up by its redemption code
    pub async fn find_by_code<'e, E>(executor: E, code: &str) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, TeamInvite>(
            r#"
            SELECT id, team_id, email, inviter_id, code, created_at
            FROM team_invites
            WHERE code = $1
            "#,
        )
        .bind(code)
        .fetch_optional(executor)
        .await
    }

    /// Deletes an invitation by code
    ///
    /// # Returns
    ///
    /// True if a row was deleted
    pub async fn delete_by_code<'e, E>(executor: E, code: &str) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query("DELETE FROM team_invites WHERE code = $1")
            .bind(code)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
