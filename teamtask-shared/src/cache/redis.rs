use ::redis::AsyncCommands;
use async_trait::async_trait;

use super::{CacheError, TasksCache, TASKS_CACHE_TTL};
use crate::models::task::Task;
use crate::redis::RedisClient;

/// Task list cache stored in Redis
///
/// Pages are stored with `SET key json EX 300` and read back with `GET`.
/// Commands share the client's timeout, so a slow Redis degrades into cache
/// misses instead of slow requests.
#[derive(Clone)]
pub struct RedisTasksCache {
    client: RedisClient,
}

impl RedisTasksCache {
    pub fn new(client: RedisClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &RedisClient {
        &self.client
    }
}

#[async_trait]
impl TasksCache for RedisTasksCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<Task>>, CacheError> {
        let key = key.to_string();
        let raw: Option<String> = self
            .client
            .run(|mut conn| async move { conn.get(key).await })
            .await?;

        match raw {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, tasks: &[Task]) -> Result<(), CacheError> {
        let json = serde_json::to_string(tasks)?;
        let key = key.to_string();

        self.client
            .run::<(), _, _>(|mut conn| async move {
                conn.set_ex(key, json, TASKS_CACHE_TTL.as_secs()).await
            })
            .await?;

        Ok(())
    }

    async fn ping(&self) -> Result<(), CacheError> {
        if !self.client.ping().await? {
            return Err(CacheError::Store("unexpected PING reply".to_string()));
        }

        Ok(())
    }
}
