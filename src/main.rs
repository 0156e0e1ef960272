use std::path::PathBuf;
use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use movie_curator::{
    config::{Config, StoreBackend},
    db::{self, Cache, FileListStore, ListStore, PostgresListStore, RedisListStore},
    models::{markdown_link, uri_label},
    services::{Curator, DbpediaProvider},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;

    let store: Arc<dyn ListStore> = match config.store_backend {
        StoreBackend::File => {
            let store = FileListStore::new(&config.list_dir);
            tracing::info!(dir = %store.dir().display(), "Using file list store");
            Arc::new(store)
        }
        StoreBackend::Redis => {
            Arc::new(RedisListStore::new(db::create_redis_client(&config.redis_url)?))
        }
        StoreBackend::Postgres => {
            let pool = db::create_pool(&config.database_url).await?;
            Arc::new(PostgresListStore::new(pool).await?)
        }
    };

    let (cache, cache_writer) = if config.cache_responses {
        let (cache, handle) = Cache::new(db::create_redis_client(&config.redis_url)?);
        (Some(cache), Some(handle))
    } else {
        (None, None)
    };

    let provider = Arc::new(
        DbpediaProvider::new(
            config.sparql_endpoint.clone(),
            cache,
            config.overrides_dir.as_ref().map(PathBuf::from),
        )
        .with_people_search_api(config.people_search_api.clone()),
    );

    let curator = Curator::open(&config.list_name, store, provider).await?;

    let unrated = curator.unrated_movies().await;
    tracing::info!(
        list = %curator.list_name(),
        unique_movies = curator.unique().read().await.len(),
        complete_movies = curator.complete().read().await.len(),
        unrated_movies = unrated.len(),
        "Curation summary"
    );

    match curator.coverage_report().await {
        Ok(report) => {
            for contributor in report.uncovered().take(config.report_limit) {
                tracing::info!(
                    contributor = %uri_label(&contributor.uri),
                    link = %markdown_link(&contributor.uri, None),
                    films = contributor.film_count,
                    "Frequent contributor not yet on the unique list"
                );
            }
        }
        Err(e) => tracing::warn!(error = %e, "Coverage report unavailable"),
    }

    if let Some(handle) = cache_writer {
        handle.shutdown().await;
    }

    Ok(())
}
