use sqlx::{postgres::PgPoolOptions, PgPool};

use super::{ListKey, ListStore};
use crate::error::AppResult;

/// Creates a PostgreSQL connection pool
///
/// Establishes a pool of database connections for efficient reuse.
/// The pool automatically manages connection lifecycle and limits.
pub async fn create_pool(database_url: &str) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await?;

    Ok(pool)
}

/// Stores snapshots in the `movie_lists` table, one row per list key
#[derive(Clone)]
pub struct PostgresListStore {
    pool: PgPool,
}

impl PostgresListStore {
    /// Wraps the pool, applying pending migrations first
    pub async fn new(pool: PgPool) -> AppResult<Self> {
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(sqlx::Error::from)?;
        Ok(Self { pool })
    }
}

#[async_trait::async_trait]
impl ListStore for PostgresListStore {
    async fn load(&self, key: &ListKey) -> AppResult<Option<String>> {
        let snapshot: Option<String> =
            sqlx::query_scalar("SELECT snapshot FROM movie_lists WHERE name = $1")
                .bind(key.to_string())
                .fetch_optional(&self.pool)
                .await?;

        tracing::debug!(key = %key, found = snapshot.is_some(), "Loaded list snapshot");
        Ok(snapshot)
    }

    async fn save(&self, key: &ListKey, snapshot: &str) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO movie_lists (name, snapshot, updated_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (name)
            DO UPDATE SET snapshot = EXCLUDED.snapshot, updated_at = NOW()
            "#,
        )
        .bind(key.to_string())
        .bind(snapshot)
        .execute(&self.pool)
        .await?;

        tracing::debug!(key = %key, bytes = snapshot.len(), "Saved list snapshot");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "postgres"
    }
}
