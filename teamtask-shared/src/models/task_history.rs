/// Append-only task change log
///
/// # Schema
///
/// ```sql
/// CREATE TABLE task_history (
///     id UUID PRIMARY KEY,
///     task_id UUID NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
///     changed_by UUID NOT NULL REFERENCES users(id),
///     changes JSONB NOT NULL DEFAULT '{}'::jsonb,
///     changed_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// Exactly one row is written per successful task update, in the same
/// transaction as the update itself. `changes` maps each modified field to
/// `{"from": old, "to": new}`:
///
/// ```json
/// {
///   "title":  { "from": "a",    "to": "b"    },
///   "status": { "from": "todo", "to": "done" }
/// }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value as JsonValue};
use sqlx::types::Json;
use sqlx::PgExecutor;
use uuid::Uuid;

use super::task::Task;

/// History row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct TaskHistory {
    pub id: Uuid,
    pub task_id: Uuid,
    pub changed_by: Uuid,
    pub changes: Json<TaskChanges>,
    pub changed_at: DateTime<Utc>,
}

/// Per-field `{from, to}` diff between two versions of a task
///
/// Only `title`, `description`, `status` and `assignee_id` are tracked.
/// Unchanged fields are omitted; the map may be empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskChanges(pub Map<String, JsonValue>);

impl TaskChanges {
    /// Computes the minimal diff from `before` to `after`
    pub fn between(before: &Task, after: &Task) -> Self {
        let mut changes = Map::new();

        if before.title != after.title {
            changes.insert("title".into(), change(&before.title, &after.title));
        }
        if before.description != after.description {
            changes.insert(
                "description".into(),
                change(&before.description, &after.description),
            );
        }
        if before.status != after.status {
            changes.insert("status".into(), change(&before.status, &after.status));
        }
        if before.assignee_id != after.assignee_id {
            changes.insert(
                "assignee_id".into(),
                change(&before.assignee_id, &after.assignee_id),
            );
        }

        TaskChanges(changes)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&JsonValue> {
        self.0.get(field)
    }
}

fn change<T: Serialize>(from: &T, to: &T) -> JsonValue {
    json!({ "from": from, "to": to })
}

impl TaskHistory {
    /// Appends a history row
    pub async fn add<'e, E>(
        executor: E,
        task_id: Uuid,
        changed_by: Uuid,
        changes: TaskChanges,
        changed_at: DateTime<Utc>,
    ) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, TaskHistory>(
            r#"
            INSERT INTO task_history (id, task_id, changed_by, changes, changed_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, task_id, changed_by, changes, changed_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(task_id)
        .bind(changed_by)
        .bind(Json(changes))
        .bind(changed_at)
        .fetch_one(executor)
        .await
    }

    /// Lists a task's history, oldest first
    pub async fn list_by_task<'e, E>(executor: E, task_id: Uuid) -> Result<Vec<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, TaskHistory>(
            r#"
            SELECT id, task_id, changed_by, changes, changed_at
            FROM task_history
            WHERE task_id = $1
            ORDER BY changed_at ASC, id ASC
            "#,
        )
        .bind(task_id)
        .fetch_all(executor)
        .await
    }

    /// Number of history rows recorded for a task
    pub async fn count_by_task<'e, E>(executor: E, task_id: Uuid) -> Result<i64, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_scalar("SELECT COUNT(*) FROM task_history WHERE task_id = $1")
            .bind(task_id)
            .fetch_one(executor)
            .await
    }
}
