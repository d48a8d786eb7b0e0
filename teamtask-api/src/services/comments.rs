use sqlx::PgPool;
use teamtask_shared::auth::authorization::{require_author, require_membership};
use teamtask_shared::models::comment::{Comment, CreateComment};
use teamtask_shared::models::task::Task;
use teamtask_shared::models::{Page, Pagination};
use uuid::Uuid;

use super::{require_non_blank, ServiceError, ServiceResult};

/// Task comments
///
/// Reading and writing require membership in the task's team. Editing and
/// deleting are reserved to the comment's author.
#[derive(Clone)]
pub struct CommentService {
    db: PgPool,
}

impl CommentService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn create(&self, user_id: Uuid, task_id: Uuid, body: &str) -> ServiceResult<Comment> {
        let body = require_non_blank(body, "body")?;
        self.require_task_member(user_id, task_id).await?;

        let comment = Comment::create(
            &self.db,
            CreateComment {
                task_id,
                user_id,
                body,
            },
        )
        .await?;

        tracing::debug!(comment_id = %comment.id, task_id = %task_id, "comment created");

        Ok(comment)
    }

    /// One page of a task's comments, oldest first
    pub async fn list(
        &self,
        user_id: Uuid,
        task_id: Uuid,
        page: Option<i64>,
        per_page: Option<i64>,
    ) -> ServiceResult<Page<Comment>> {
        self.require_task_member(user_id, task_id).await?;

        let pagination = Pagination::normalize(page, per_page);
        let items = Comment::list(&self.db, task_id, pagination).await?;
        let total = Comment::count(&self.db, task_id).await?;

        Ok(Page::new(items, total, pagination))
    }

    pub async fn update(
        &self,
        user_id: Uuid,
        task_id: Uuid,
        comment_id: Uuid,
        body: &str,
    ) -> ServiceResult<Comment> {
        let body = require_non_blank(body, "body")?;

        let comment = self.find(task_id, comment_id).await?;
        require_author(user_id, comment.user_id)?;

        Comment::update_body(&self.db, comment_id, &body)
            .await?
            .ok_or(ServiceError::NotFound("comment"))
    }

    pub async fn delete(&self, user_id: Uuid, task_id: Uuid, comment_id: Uuid) -> ServiceResult<()> {
        let comment = self.find(task_id, comment_id).await?;
        require_author(user_id, comment.user_id)?;

        if !Comment::delete(&self.db, comment_id).await? {
            return Err(ServiceError::NotFound("comment"));
        }

        tracing::debug!(comment_id = %comment_id, task_id = %task_id, "comment deleted");

        Ok(())
    }

    async fn find(&self, task_id: Uuid, comment_id: Uuid) -> ServiceResult<Comment> {
        Comment::find(&self.db, task_id, comment_id)
            .await?
            .ok_or(ServiceError::NotFound("comment"))
    }

    async fn require_task_member(&self, user_id: Uuid, task_id: Uuid) -> ServiceResult<()> {
        let team_id = Task::find_team_id(&self.db, task_id)
            .await?
            .ok_or(ServiceError::NotFound("task"))?;

        require_membership(&self.db, team_id, user_id).await?;

        Ok(())
    }
}
