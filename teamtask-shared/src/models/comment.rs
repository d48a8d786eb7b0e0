/// Task comment model and database operations
///
/// # Schema
///
/// ```sql
/// CREATE TABLE task_comments (
///     id UUID PRIMARY KEY,
///     task_id UUID NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
///     user_id UUID NOT NULL REFERENCES users(id),
///     body TEXT NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// Only the author may edit or delete a comment; that rule is enforced by the
/// comments service.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;
use uuid::Uuid;

use super::Pagination;

/// Comment row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Comment {
    pub id: Uuid,
    pub task_id: Uuid,
    pub user_id: Uuid,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

/// Input for creating a comment
#[derive(Debug, Clone)]
pub struct CreateComment {
    pub task_id: Uuid,
    pub user_id: Uuid,
    pub body: String,
}

impl Comment {
    pub async fn create<'e, E>(executor: E, data: CreateComment) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Comment>(
            r#"
            INSERT INTO task_comments (id, task_id, user_id, body, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, task_id, user_id, body, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(data.task_id)
        .bind(data.user_id)
        .bind(&data.body)
        .bind(Utc::now())
        .fetch_one(executor)
        .await
    }

    /// Finds a comment that belongs to the given task
    pub async fn find<'e, E>(
        executor: E,
        task_id: Uuid,
        comment_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Comment>(
            r#"
            SELECT id, task_id, user_id, body, created_at
            FROM task_comments
            WHERE id = $1 AND task_id = $2
            "#,
        )
        .bind(comment_id)
        .bind(task_id)
        .fetch_optional(executor)
        .await
    }

    /// Lists one page of a task's comments, oldest first
    pub async fn list<'e, E>(
        executor: E,
        task_id: Uuid,
        pagination: Pagination,
    ) -> Result<Vec<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Comment>(
            r#"
            SELECT id, task_id, user_id, body, created_at
            FROM task_comments
            WHERE task_id = $1
            ORDER BY created_at ASC, id ASC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(task_id)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(executor)
        .await
    }

    pub async fn count<'e, E>(executor: E, task_id: Uuid) -> Result<i64, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_scalar("SELECT COUNT(*) FROM task_comments WHERE task_id = $1")
            .bind(task_id)
            .fetch_one(executor)
            .await
    }

    /// Replaces the body and returns the updated row
    pub async fn update_body<'e, E>(
        executor: E,
        comment_id: Uuid,
        body: &str,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Comment>(
            r#"
            UPDATE task_comments
            SET body = $2
            WHERE id = $1
            RETURNING id, task_id, user_id, body, created_at
            "#,
        )
        .bind(comment_id)
        .bind(body)
        .fetch_optional(executor)
        .await
    }

    /// Deletes a comment
    ///
    /// # Returns
    ///
    /// True if a row was deleted
    pub async fn delete<'e, E>(executor: E, comment_id: Uuid) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query("DELETE FROM task_comments WHERE id = $1")
            .bind(comment_id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
