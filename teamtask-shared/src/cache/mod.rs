//! Read-through cache for task lists
//!
//! Task list pages are cached as JSON under a key built from the team, the
//! filter and the pagination:
//!
//! ```text
//! tasks:{team_id}:status={status}:assignee={assignee_id}:page={page}:per={per_page}
//! ```
//!
//! Absent filter values leave their segment empty, e.g.
//! `tasks:5f0c...:status=:assignee=:page=1:per=20`.
//!
//! Entries live for [`TASKS_CACHE_TTL`] and are never invalidated on writes,
//! so readers may see a page that is up to one TTL old. Only items are
//! cached; totals are always counted fresh. Callers treat every
//! [`CacheError`] as a miss.

pub mod memory;
pub mod redis;

pub use memory::{CacheStats, MemoryTasksCache};
pub use self::redis::RedisTasksCache;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use crate::models::task::{Task, TaskFilter};
use crate::models::Pagination;
use crate::redis::RedisClientError;

/// Lifetime of a cached task list page
pub const TASKS_CACHE_TTL: Duration = Duration::from_secs(5 * 60);

/// Cache errors
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("cache store error: {0}")]
    Store(String),

    #[error("cache serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<RedisClientError> for CacheError {
    fn from(err: RedisClientError) -> Self {
        CacheError::Store(err.to_string())
    }
}

/// Storage for task list pages
#[async_trait]
pub trait TasksCache: Send + Sync {
    /// Returns the cached page, or `None` on a miss
    async fn get(&self, key: &str) -> Result<Option<Vec<Task>>, CacheError>;

    /// Stores a page for [`TASKS_CACHE_TTL`]
    async fn set(&self, key: &str, tasks: &[Task]) -> Result<(), CacheError>;

    /// Checks that the backing store answers
    async fn ping(&self) -> Result<(), CacheError>;
}

#[async_trait]
impl<C: TasksCache + ?Sized> TasksCache for Arc<C> {
    async fn get(&self, key: &str) -> Result<Option<Vec<Task>>, CacheError> {
        (**self).get(key).await
    }

    async fn set(&self, key: &str, tasks: &[Task]) -> Result<(), CacheError> {
        (**self).set(key, tasks).await
    }

    async fn ping(&self) -> Result<(), CacheError> {
        (**self).ping().await
    }
}

/// Builds the cache key for one page of a filtered task list
pub fn tasks_list_key(filter: &TaskFilter, pagination: Pagination) -> String {
    format!(
        "tasks:{}:status={}:assignee={}:page={}:per={}",
        filter.team_id,
        filter.status.map(|s| s.as_str()).unwrap_or_default(),
        filter.assignee_id.map(|id| id.to_string()).unwrap_or_default(),
        pagination.page,
        pagination.per_page,
    )
}
