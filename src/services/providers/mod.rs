//! Movie metadata provider abstraction
//!
//! Providers turn knowledge-graph lookups into typed [`Movie`] records before
//! anything reaches the lists. Transport failures surface as
//! `AppError::ProviderUnavailable`, never as an empty result.
use tracing::instrument;

use crate::{
    error::{AppError, AppResult},
    models::{Filmography, Movie, MovieSearchResult, PersonSearchResult, Role},
};

pub mod dbpedia;

pub use dbpedia::DbpediaProvider;

/// Trait for movie metadata providers
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait MetadataProvider: Send + Sync {
    /// Search for movies whose title contains `query`
    async fn search_titles(&self, query: &str) -> AppResult<Vec<MovieSearchResult>>;

    /// Fetch a movie with its directors, writers, and actors
    ///
    /// Accepts either a movie URI or a title. Titles resolve to the best
    /// search hit; `AppError::NotFound` when nothing matches.
    async fn fetch_movie(&self, uri_or_title: &str) -> AppResult<Movie>;

    /// Resolve a person's name to candidate contributor URIs, best match first
    async fn search_people(&self, query: &str) -> AppResult<Vec<PersonSearchResult>>;

    /// Fetch the movies a contributor is credited on in `role`
    async fn fetch_filmography(&self, contributor: &str, role: Role) -> AppResult<Filmography>;

    /// Fetch several movies in parallel
    ///
    /// Individual failures are logged and skipped. Fails only when nothing
    /// could be fetched.
    async fn fetch_movies_batch(&self, uris: Vec<String>) -> AppResult<Vec<Movie>> {
        let mut tasks = Vec::new();

        for uri in uris {
            let provider = self.clone_for_task();
            let task = tokio::spawn(async move { provider.fetch_movie(&uri).await });
            tasks.push(task);
        }

        let mut results = Vec::new();
        let mut errors = Vec::new();

        for task in tasks {
            match task.await {
                Ok(Ok(movie)) => results.push(movie),
                Ok(Err(e)) => {
                    tracing::error!(error = %e, "Movie fetch failed");
                    errors.push(e);
                }
                Err(e) => {
                    tracing::error!(error = %e, "Task join error");
                    errors.push(AppError::Internal(e.to_string()));
                }
            }
        }

        if !errors.is_empty() {
            tracing::warn!(
                success_count = results.len(),
                error_count = errors.len(),
                "Partial movie fetch failure"
            );
        }

        if results.is_empty() && !errors.is_empty() {
            return Err(AppError::ProviderUnavailable(
                "Failed to fetch any movie data".to_string(),
            ));
        }

        Ok(results)
    }

    /// Clone provider for parallel task execution
    fn clone_for_task(&self) -> Box<dyn MetadataProvider>;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}

/// Movies crediting `contributor` in any role, deduplicated in role order
#[instrument(skip(provider), fields(provider = provider.name()))]
pub async fn fetch_all_films(
    provider: &dyn MetadataProvider,
    contributor: &str,
) -> AppResult<Vec<String>> {
    let mut movies: Vec<String> = Vec::new();
    for role in Role::ALL {
        let filmography = provider.fetch_filmography(contributor, role).await?;
        for movie in filmography.movies {
            if !movies.contains(&movie) {
                movies.push(movie);
            }
        }
    }
    Ok(movies)
}
