use std::fmt::Display;

use crate::error::AppResult;

pub mod file;
pub mod postgres;
pub mod redis;

pub use file::FileListStore;
pub use postgres::{create_pool, PostgresListStore};
pub use self::redis::{create_redis_client, Cache, CacheKey, RedisListStore};

/// Identifies one persisted list snapshot
///
/// Each kind renders under its own prefix, so no list name can collide with
/// another list's storage key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ListKey {
    Unique(String),
    Complete(String),
}

impl ListKey {
    /// User-chosen list name
    pub fn list_name(&self) -> &str {
        match self {
            ListKey::Unique(name) | ListKey::Complete(name) => name,
        }
    }
}

impl Display for ListKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ListKey::Unique(name) => write!(f, "unique_{}", name),
            ListKey::Complete(name) => write!(f, "complete_{}", name),
        }
    }
}

/// Durable storage for list snapshots
///
/// Stores hold opaque serialized snapshots. A save replaces the whole snapshot;
/// there are no partial writes.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait ListStore: Send + Sync {
    /// Returns the stored snapshot, or `None` if the list was never saved
    async fn load(&self, key: &ListKey) -> AppResult<Option<String>>;

    /// Replaces the stored snapshot
    async fn save(&self, key: &ListKey, snapshot: &str) -> AppResult<()>;

    /// Store name for logging and debugging
    fn name(&self) -> &'static str;
}
