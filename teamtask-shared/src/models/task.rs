/// Task model and database operations
///
/// # Schema
///
/// ```sql
/// CREATE TYPE task_status AS ENUM ('todo', 'in_progress', 'done');
///
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY,
///     team_id UUID NOT NULL REFERENCES teams(id) ON DELETE CASCADE,
///     title VARCHAR(255) NOT NULL,
///     description TEXT,
///     status task_status NOT NULL DEFAULT 'todo',
///     assignee_id UUID REFERENCES users(id) ON DELETE SET NULL,
///     created_by UUID NOT NULL REFERENCES users(id),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ,
///     completed_at TIMESTAMPTZ
/// );
/// ```
///
/// `assignee_id` is deliberately not tied to `team_members`: membership of the
/// assignee is checked when a task is written, and later violations show up in
/// the invalid-assignees report.
///
/// # Status
///
/// ```text
/// todo <-> in_progress <-> done     (every transition allowed)
/// ```
///
/// `completed_at` is stamped when a task enters `done` and cleared when it
/// leaves it.
///
/// # Example
///
/// ```no_run
/// use teamtask_shared::models::task::{Task, TaskPatch, TaskStatus};
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool, task_id: Uuid) -> Result<(), sqlx::Error> {
/// let mut tx = pool.begin().await?;
/// if let Some(current) = Task::find_for_update(&mut *tx, task_id).await? {
///     let patch = TaskPatch { status: Some(TaskStatus::Done), ..Default::default() };
///     let next = current.apply(&patch, chrono::Utc::now());
///     Task::update(&mut *tx, &next).await?;
/// }
/// tx.commit().await?;
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::Pagination;

/// Task status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Todo,
    InProgress,
    Done,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "todo",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Done => "done",
        }
    }

    /// Checks if this is the terminal `done` status
    pub fn is_done(&self) -> bool {
        matches!(self, TaskStatus::Done)
    }
}

impl Default for TaskStatus {
    fn default() -> Self {
        TaskStatus::Todo
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "todo" => Ok(TaskStatus::Todo),
            "in_progress" => Ok(TaskStatus::InProgress),
            "done" => Ok(TaskStatus::Done),
            other => Err(format!("unknown task status: {}", other)),
        }
    }
}

/// Task row
///
/// Also the JSON view returned by the API and stored in the list cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    pub id: Uuid,
    pub team_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub assignee_id: Option<Uuid>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Input for creating a task
#[derive(Debug, Clone)]
pub struct CreateTask {
    pub team_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub assignee_id: Option<Uuid>,
    pub created_by: Uuid,
}

/// Partial update of a task
///
/// The outer `Option` means "field present in the request"; for nullable
/// columns the inner `Option` carries the new value, so `Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub status: Option<TaskStatus>,
    pub assignee_id: Option<Option<Uuid>>,
}

/// Filter for listing a team's tasks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskFilter {
    pub team_id: Uuid,
    pub status: Option<TaskStatus>,
    pub assignee_id: Option<Uuid>,
}

const TASK_COLUMNS: &str = "id, team_id, title, description, status, assignee_id, \
                            created_by, created_at, updated_at, completed_at";

impl Task {
    /// Inserts a task
    ///
    /// `created_at` and `updated_at` are both set to now; `completed_at` is
    /// stamped when the task starts out `done`.
    pub async fn create<'e, E>(executor: E, data: CreateTask) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let now = Utc::now();
        let completed_at = data.status.is_done().then_some(now);

        sqlx::query_as::<_, Task>(&format!(
            r#"
            INSERT INTO tasks (id, team_id, title, description, status, assignee_id,
                               created_by, created_at, updated_at, completed_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8, $9)
            RETURNING {TASK_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(data.team_id)
        .bind(&data.title)
        .bind(&data.description)
        .bind(data.status)
        .bind(data.assignee_id)
        .bind(data.created_by)
        .bind(now)
        .bind(completed_at)
        .fetch_one(executor)
        .await
    }

    /// Finds a task by ID
    pub async fn find_by_id<'e, E>(executor: E, id: Uuid) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Task>(&format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1"))
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Loads a task and locks its row until the surrounding transaction ends
    ///
    /// Concurrent updaters of the same task queue up here, so updates of one
    /// task are applied (and their history rows written) in commit order.
    /// Must be called with a transaction for the lock to outlive the call.
    pub async fn find_for_update<'e, E>(executor: E, id: Uuid) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Task>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(executor)
        .await
    }

    /// Resolves the team a task belongs to
    pub async fn find_team_id<'e, E>(executor: E, id: Uuid) -> Result<Option<Uuid>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_scalar("SELECT team_id FROM tasks WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Lists one page of a team's tasks, newest first
    pub async fn list<'e, E>(
        executor: E,
        filter: &TaskFilter,
        pagination: Pagination,
    ) -> Result<Vec<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Task>(&format!(
            r#"
            SELECT {TASK_COLUMNS}
            FROM tasks
            WHERE team_id = $1
              AND ($2::task_status IS NULL OR status = $2)
              AND ($3::uuid IS NULL OR assignee_id = $3)
            ORDER BY created_at DESC, id DESC
            LIMIT $4 OFFSET $5
            "#
        ))
        .bind(filter.team_id)
        .bind(filter.status)
        .bind(filter.assignee_id)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(executor)
        .await
    }

    /// Counts all tasks matching a filter, ignoring pagination
    pub async fn count<'e, E>(executor: E, filter: &TaskFilter) -> Result<i64, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM tasks
            WHERE team_id = $1
              AND ($2::task_status IS NULL OR status = $2)
              AND ($3::uuid IS NULL OR assignee_id = $3)
            "#,
        )
        .bind(filter.team_id)
        .bind(filter.status)
        .bind(filter.assignee_id)
        .fetch_one(executor)
        .await
    }

    /// Writes the mutable columns of `task` back to its row
    pub async fn update<'e, E>(executor: E, task: &Task) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Task>(&format!(
            r#"
            UPDATE tasks
            SET title = $2,
                description = $3,
                status = $4,
                assignee_id = $5,
                updated_at = $6,
                completed_at = $7
            WHERE id = $1
            RETURNING {TASK_COLUMNS}
            "#
        ))
        .bind(task.id)
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.status)
        .bind(task.assignee_id)
        .bind(task.updated_at)
        .bind(task.completed_at)
        .fetch_one(executor)
        .await
    }

    /// Returns the task as it looks after applying `patch` at time `now`
    ///
    /// Fields absent from the patch keep their value. `completed_at` is
    /// recomputed on every update: `now` when the resulting status is `done`,
    /// null otherwise.
    pub fn apply(&self, patch: &TaskPatch, now: DateTime<Utc>) -> Task {
        let mut next = self.clone();

        if let Some(title) = &patch.title {
            next.title = title.clone();
        }
        if let Some(description) = &patch.description {
            next.description = description.clone();
        }
        if let Some(status) = patch.status {
            next.status = status;
        }
        if let Some(assignee_id) = patch.assignee_id {
            next.assignee_id = assignee_id;
        }

        next.completed_at = next.status.is_done().then_some(now);
        next.updated_at = Some(now);

        next
    }
}
