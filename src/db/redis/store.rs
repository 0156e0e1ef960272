use redis::AsyncCommands;
use redis::Client;

use crate::db::{ListKey, ListStore};
use crate::error::AppResult;

const KEY_PREFIX: &str = "movie_list";

/// Stores snapshots as plain Redis strings under `movie_list:<key>`, with no expiry
#[derive(Clone)]
pub struct RedisListStore {
    redis_client: Client,
}

impl RedisListStore {
    pub fn new(redis_client: Client) -> Self {
        Self { redis_client }
    }

    fn redis_key(key: &ListKey) -> String {
        format!("{}:{}", KEY_PREFIX, key)
    }
}

#[async_trait::async_trait]
impl ListStore for RedisListStore {
    async fn load(&self, key: &ListKey) -> AppResult<Option<String>> {
        let mut conn = self.redis_client.get_multiplexed_async_connection().await?;
        let snapshot: Option<String> = conn.get(Self::redis_key(key)).await?;

        tracing::debug!(key = %key, found = snapshot.is_some(), "Loaded list snapshot");
        Ok(snapshot)
    }

    async fn save(&self, key: &ListKey, snapshot: &str) -> AppResult<()> {
        let mut conn = self.redis_client.get_multiplexed_async_connection().await?;
        let _: () = conn.set(Self::redis_key(key), snapshot).await?;

        tracing::debug!(key = %key, bytes = snapshot.len(), "Saved list snapshot");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "redis"
    }
}
