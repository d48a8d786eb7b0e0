/// Tasks: creation, cached listing, transactional updates and history
///
/// # Update transaction
///
/// ```text
/// BEGIN
///   SELECT ... FROM tasks WHERE id = $1 FOR UPDATE   -- serializes writers of one task
///   (author check, assignee membership check)
///   UPDATE tasks SET ...
///   INSERT INTO task_history (...)                   -- one row per update, even if nothing changed
/// COMMIT
/// ```
///
/// Any error before `COMMIT` drops the transaction, which rolls back both
/// the task row and the history row.
///
/// # Listing
///
/// Pages are read through the tasks cache. Only items are cached; the total
/// is counted on every request. Cache failures are logged and treated as
/// misses, and writes never invalidate cached pages.

use chrono::Utc;
use sqlx::PgPool;
use std::sync::Arc;
use teamtask_shared::auth::authorization::{require_author, require_membership};
use teamtask_shared::cache::{tasks_list_key, TasksCache};
use teamtask_shared::models::task::{CreateTask, Task, TaskFilter, TaskPatch, TaskStatus};
use teamtask_shared::models::task_history::{TaskChanges, TaskHistory};
use teamtask_shared::models::team_member::TeamMember;
use teamtask_shared::models::{Page, Pagination};
use uuid::Uuid;

use super::{require_non_blank, ServiceError, ServiceResult};

/// Input for creating a task
#[derive(Debug, Clone)]
pub struct NewTask {
    pub team_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    /// Defaults to `todo`
    pub status: Option<TaskStatus>,
    pub assignee_id: Option<Uuid>,
}

/// Filter and raw pagination for listing tasks
#[derive(Debug, Clone, Copy)]
pub struct TaskListQuery {
    pub team_id: Uuid,
    pub status: Option<TaskStatus>,
    pub assignee_id: Option<Uuid>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

#[derive(Clone)]
pub struct TaskService {
    db: PgPool,
    cache: Arc<dyn TasksCache>,
}

impl TaskService {
    pub fn new(db: PgPool, cache: Arc<dyn TasksCache>) -> Self {
        Self { db, cache }
    }

    /// Creates a task in a team the caller belongs to
    ///
    /// No history row is written on creation.
    pub async fn create(&self, user_id: Uuid, input: NewTask) -> ServiceResult<Task> {
        let title = require_non_blank(&input.title, "title")?;

        require_membership(&self.db, input.team_id, user_id).await?;

        if let Some(assignee_id) = input.assignee_id {
            if !TeamMember::is_member(&self.db, input.team_id, assignee_id).await? {
                return Err(ServiceError::InvalidAssignee);
            }
        }

        let task = Task::create(
            &self.db,
            CreateTask {
                team_id: input.team_id,
                title,
                description: input.description,
                status: input.status.unwrap_or_default(),
                assignee_id: input.assignee_id,
                created_by: user_id,
            },
        )
        .await?;

        tracing::info!(task_id = %task.id, team_id = %task.team_id, "task created");

        Ok(task)
    }

    /// Lists one page of a team's tasks, newest first
    pub async fn list(&self, user_id: Uuid, query: TaskListQuery) -> ServiceResult<Page<Task>> {
        require_membership(&self.db, query.team_id, user_id).await?;

        let pagination = Pagination::normalize(query.page, query.per_page);
        let filter = TaskFilter {
            team_id: query.team_id,
            status: query.status,
            assignee_id: query.assignee_id,
        };
        let key = tasks_list_key(&filter, pagination);

        let cached = match self.cache.get(&key).await {
            Ok(cached) => cached,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "tasks cache read failed");
                None
            }
        };

        let items = match cached {
            Some(items) => {
                tracing::debug!(key = %key, "tasks cache hit");
                items
            }
            None => {
                let items = Task::list(&self.db, &filter, pagination).await?;
                if let Err(e) = self.cache.set(&key, &items).await {
                    tracing::warn!(key = %key, error = %e, "tasks cache write failed");
                }
                items
            }
        };

        let total = Task::count(&self.db, &filter).await?;

        Ok(Page::new(items, total, pagination))
    }

    /// Applies a partial update and records it in the task history
    ///
    /// Only the task's creator may update it. A new assignee must be a member
    /// of the task's team; clearing the assignee needs no check.
    pub async fn update(
        &self,
        user_id: Uuid,
        task_id: Uuid,
        mut patch: TaskPatch,
    ) -> ServiceResult<Task> {
        if let Some(title) = &patch.title {
            patch.title = Some(require_non_blank(title, "title")?);
        }

        let mut tx = self.db.begin().await?;

        let current = Task::find_for_update(&mut *tx, task_id)
            .await?
            .ok_or(ServiceError::NotFound("task"))?;

        require_author(user_id, current.created_by)?;

        if let Some(Some(assignee_id)) = patch.assignee_id {
            if !TeamMember::is_member(&mut *tx, current.team_id, assignee_id).await? {
                return Err(ServiceError::InvalidAssignee);
            }
        }

        let now = Utc::now();
        let next = current.apply(&patch, now);
        let changes = TaskChanges::between(&current, &next);

        let updated = Task::update(&mut *tx, &next).await?;
        TaskHistory::add(&mut *tx, task_id, user_id, changes, now).await?;

        tx.commit().await?;

        tracing::info!(task_id = %task_id, changed_by = %user_id, "task updated");

        Ok(updated)
    }

    /// A task's change log, oldest first
    pub async fn history(&self, user_id: Uuid, task_id: Uuid) -> ServiceResult<Vec<TaskHistory>> {
        let team_id = Task::find_team_id(&self.db, task_id)
            .await?
            .ok_or(ServiceError::NotFound("task"))?;

        require_membership(&self.db, team_id, user_id).await?;

        Ok(TaskHistory::list_by_task(&self.db, task_id).await?)
    }
}
