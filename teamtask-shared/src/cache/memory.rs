/// In-process task list cache
///
/// Entries are stored as serialized JSON, exactly as the Redis cache stores
/// them, and expire after the configured TTL (measured with
/// `tokio::time::Instant`, so paused-clock tests can advance past it).
/// Every write sweeps out expired entries, so the map only holds keys
/// written within the last TTL.
///
/// Hit, miss and set counters make cache behavior observable in tests.
/// [`MemoryTasksCache::fail_with`] turns every call into an error to exercise
/// the fall-through path.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::Instant;

use super::{CacheError, TasksCache, TASKS_CACHE_TTL};
use crate::models::task::Task;

#[derive(Debug)]
struct Entry {
    json: String,
    expires_at: Instant,
}

#[derive(Debug, Default)]
struct State {
    entries: HashMap<String, Entry>,
    failure: Option<String>,
}

/// Snapshot of cache counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub sets: u64,
}

/// TTL-aware in-memory cache
#[derive(Debug)]
pub struct MemoryTasksCache {
    ttl: Duration,
    state: Mutex<State>,
    hits: AtomicU64,
    misses: AtomicU64,
    sets: AtomicU64,
}

impl MemoryTasksCache {
    pub fn new() -> Self {
        Self::with_ttl(TASKS_CACHE_TTL)
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            ttl,
            state: Mutex::new(State::default()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            sets: AtomicU64::new(0),
        }
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            sets: self.sets.load(Ordering::Relaxed),
        }
    }

    /// Number of stored entries, expired ones included until the next read
    /// of that key or the next write
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Makes every following call fail with `CacheError::Store(message)`;
    /// `None` restores normal operation
    pub fn fail_with(&self, message: Option<&str>) {
        self.lock().failure = message.map(str::to_string);
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for MemoryTasksCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TasksCache for MemoryTasksCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<Task>>, CacheError> {
        let json = {
            let mut state = self.lock();
            if let Some(message) = &state.failure {
                return Err(CacheError::Store(message.clone()));
            }

            let now = Instant::now();
            match state.entries.get(key).map(|e| (e.expires_at > now, e.json.clone())) {
                Some((true, json)) => Some(json),
                Some((false, _)) => {
                    state.entries.remove(key);
                    None
                }
                None => None,
            }
        };

        match json {
            Some(json) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Ok(Some(serde_json::from_str(&json)?))
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                Ok(None)
            }
        }
    }

    async fn set(&self, key: &str, tasks: &[Task]) -> Result<(), CacheError> {
        let json = serde_json::to_string(tasks)?;

        let mut state = self.lock();
        if let Some(message) = &state.failure {
            return Err(CacheError::Store(message.clone()));
        }

        let now = Instant::now();
        state.entries.retain(|_, entry| entry.expires_at > now);
        state.entries.insert(
            key.to_string(),
            Entry {
                json,
                expires_at: now + self.ttl,
            },
        );
        self.sets.fetch_add(1, Ordering::Relaxed);

        Ok(())
    }

    async fn ping(&self) -> Result<(), CacheError> {
        match &self.lock().failure {
            Some(message) => Err(CacheError::Store(message.clone())),
            None => Ok(()),
        }
    }
}
