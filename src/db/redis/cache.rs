use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use redis::Client;
use serde::{de::DeserializeOwned, Serialize};
use std::fmt::Display;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::AppResult;
use crate::models::Role;

const KEY_PREFIX: &str = "movie_curator";
const SEARCH_TTL_SECS: u64 = 60 * 60;
const CREDITS_TTL_SECS: u64 = 7 * 24 * 60 * 60;
const MAX_WRITE_BATCH: usize = 64;

/// Keys for cached knowledge-graph responses
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    TitleSearch(String),
    PersonSearch(String),
    MovieDetails(String),
    Filmography(Role, String),
}

impl CacheKey {
    /// Search results churn faster than credits, which almost never change
    pub fn ttl_secs(&self) -> u64 {
        match self {
            CacheKey::TitleSearch(_) | CacheKey::PersonSearch(_) => SEARCH_TTL_SECS,
            CacheKey::MovieDetails(_) | CacheKey::Filmography(..) => CREDITS_TTL_SECS,
        }
    }
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheKey::TitleSearch(query) => {
                write!(f, "{}:search:{}", KEY_PREFIX, query.trim().to_lowercase())
            }
            CacheKey::PersonSearch(name) => {
                write!(f, "{}:people:{}", KEY_PREFIX, name.trim().to_lowercase())
            }
            CacheKey::MovieDetails(uri) => write!(f, "{}:movie:{}", KEY_PREFIX, uri),
            CacheKey::Filmography(role, uri) => {
                write!(f, "{}:films:{}:{}", KEY_PREFIX, role, uri)
            }
        }
    }
}

/// Creates a Redis client
///
/// Opening a client does not connect.
pub fn create_redis_client(redis_url: &str) -> anyhow::Result<Client> {
    let client = Client::open(redis_url)?;
    Ok(client)
}

struct PendingWrite {
    key: String,
    value: String,
    ttl_secs: u64,
}

/// Read-through cache for provider responses
///
/// Reads go straight to Redis. Writes are queued to a background task that
/// pipelines them, so a lookup never waits on a store.
#[derive(Clone)]
pub struct Cache {
    redis_client: Client,
    write_tx: mpsc::UnboundedSender<PendingWrite>,
}

/// Stops the background writer once queued writes are flushed
///
/// Dropping the handle without calling [`shutdown`](Self::shutdown) also
/// stops the writer.
pub struct CacheWriterHandle {
    shutdown_tx: mpsc::Sender<()>,
    task: JoinHandle<()>,
}

impl CacheWriterHandle {
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
        if let Err(e) = self.task.await {
            tracing::error!(error = %e, "Cache writer task panicked");
        }
    }
}

impl Cache {
    /// Must be called inside a tokio runtime
    pub fn new(redis_client: Client) -> (Self, CacheWriterHandle) {
        let (write_tx, write_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        let task = tokio::spawn(Self::writer_task(
            redis_client.clone(),
            write_rx,
            shutdown_rx,
        ));

        let cache = Self {
            redis_client,
            write_tx,
        };

        (cache, CacheWriterHandle { shutdown_tx, task })
    }

    async fn writer_task(
        client: Client,
        mut write_rx: mpsc::UnboundedReceiver<PendingWrite>,
        mut shutdown_rx: mpsc::Receiver<()>,
    ) {
        tracing::debug!("Cache writer started");
        let mut conn: Option<ConnectionManager> = None;

        loop {
            tokio::select! {
                msg = write_rx.recv() => {
                    let Some(first) = msg else {
                        tracing::debug!("All cache handles dropped, cache writer stopping");
                        break;
                    };
                    let mut batch = vec![first];
                    while batch.len() < MAX_WRITE_BATCH {
                        match write_rx.try_recv() {
                            Ok(write) => batch.push(write),
                            Err(_) => break,
                        }
                    }
                    Self::flush(&client, &mut conn, batch).await;
                }
                _ = shutdown_rx.recv() => {
                    let mut batch = Vec::new();
                    while let Ok(write) = write_rx.try_recv() {
                        batch.push(write);
                    }
                    if !batch.is_empty() {
                        tracing::info!(pending = batch.len(), "Flushing cache writes before shutdown");
                        Self::flush(&client, &mut conn, batch).await;
                    }
                    break;
                }
            }
        }

        tracing::debug!("Cache writer stopped");
    }

    async fn flush(client: &Client, conn: &mut Option<ConnectionManager>, batch: Vec<PendingWrite>) {
        let count = batch.len();
        if let Err(e) = Self::write_batch(client, conn, batch).await {
            tracing::error!(error = %e, dropped = count, "Failed to write cached responses to Redis");
        }
    }

    /// Writes a batch in one pipeline; the connection is dropped on failure
    /// and reopened on the next batch
    async fn write_batch(
        client: &Client,
        conn: &mut Option<ConnectionManager>,
        batch: Vec<PendingWrite>,
    ) -> AppResult<()> {
        let mut manager = match conn.take() {
            Some(manager) => manager,
            None => ConnectionManager::new(client.clone()).await?,
        };

        let mut pipe = redis::pipe();
        for write in batch {
            pipe.set_ex(write.key, write.value, write.ttl_secs).ignore();
        }
        let _: () = pipe.query_async(&mut manager).await?;

        *conn = Some(manager);
        Ok(())
    }

    /// Returns `None` on a miss
    ///
    /// Redis being unreachable, and an entry that no longer deserializes, both
    /// count as misses: the caller falls through to the provider and the next
    /// store overwrites the entry.
    pub async fn get<T: DeserializeOwned>(&self, key: &CacheKey) -> Option<T> {
        let json = match self.read(key).await {
            Ok(json) => json?,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Cache read failed, treating as a miss");
                return None;
            }
        };

        match serde_json::from_str(&json) {
            Ok(value) => {
                tracing::debug!(key = %key, "Cache hit");
                Some(value)
            }
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Unreadable cache entry, refetching");
                None
            }
        }
    }

    async fn read(&self, key: &CacheKey) -> AppResult<Option<String>> {
        let mut conn = self.redis_client.get_multiplexed_async_connection().await?;
        let cached: Option<String> = conn.get(key.to_string()).await?;
        Ok(cached)
    }

    /// Queues a store using the key's TTL
    pub fn set_in_background<T: Serialize>(&self, key: &CacheKey, value: &T) {
        let value = match serde_json::to_string(value) {
            Ok(json) => json,
            Err(e) => {
                tracing::error!(key = %key, error = %e, "Cache serialization error");
                return;
            }
        };

        let write = PendingWrite {
            key: key.to_string(),
            value,
            ttl_secs: key.ttl_secs(),
        };

        if self.write_tx.send(write).is_err() {
            tracing::warn!(key = %key, "Cache writer stopped, dropping cache write");
        }
    }
}
