use serde::Serialize;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::instrument;

use crate::{
    db::{ListKey, ListStore},
    error::{AppError, AppResult},
    lists::{complete, AddOutcome, CompleteMovieList, UniqueMovieList},
    models::{Conflict, Movie, PersonSearchResult},
    services::{
        coverage::{self, CoverageReport},
        providers::{self, MetadataProvider},
    },
};

/// A fetched movie and what keeps it off the unique list
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MovieCheck {
    pub movie: Movie,
    pub conflicts: Vec<Conflict>,
}

impl MovieCheck {
    pub fn can_add(&self) -> bool {
        self.conflicts.is_empty()
    }
}

/// One user's pair of lists, wired to a store and a metadata provider
///
/// Each list sits behind its own lock. Metadata is always fetched before a
/// lock is taken, so no lock is held across network I/O.
#[derive(Clone)]
pub struct Curator {
    list_name: String,
    unique: Arc<RwLock<UniqueMovieList>>,
    complete: Arc<RwLock<CompleteMovieList>>,
    store: Arc<dyn ListStore>,
    provider: Arc<dyn MetadataProvider>,
}

impl Curator {
    /// Loads both lists named `list_name`, starting empty when never saved
    ///
    /// A snapshot that fails to parse is an error; curated data is never
    /// silently dropped.
    #[instrument(skip(store, provider), fields(store = store.name(), provider = provider.name()))]
    pub async fn open(
        list_name: &str,
        store: Arc<dyn ListStore>,
        provider: Arc<dyn MetadataProvider>,
    ) -> AppResult<Self> {
        let unique = match store.load(&ListKey::Unique(list_name.to_string())).await? {
            Some(json) => UniqueMovieList::from_json(list_name, &json)?,
            None => UniqueMovieList::new(),
        };

        let complete = match store.load(&ListKey::Complete(list_name.to_string())).await? {
            Some(json) => CompleteMovieList::from_json(list_name, &json)?,
            None => CompleteMovieList::new(),
        };

        tracing::info!(
            unique_movies = unique.len(),
            complete_movies = complete.len(),
            "Movie lists loaded"
        );

        Ok(Self {
            list_name: list_name.to_string(),
            unique: Arc::new(RwLock::new(unique)),
            complete: Arc::new(RwLock::new(complete)),
            store,
            provider,
        })
    }

    pub fn list_name(&self) -> &str {
        &self.list_name
    }

    pub fn unique(&self) -> &Arc<RwLock<UniqueMovieList>> {
        &self.unique
    }

    pub fn complete(&self) -> &Arc<RwLock<CompleteMovieList>> {
        &self.complete
    }

    /// Writes full snapshots of both lists
    #[instrument(skip(self), fields(list = %self.list_name))]
    pub async fn save(&self) -> AppResult<()> {
        let unique_snapshot = self.unique.read().await.to_snapshot();
        let complete_snapshot = self.complete.read().await.to_snapshot();

        let unique_json = serde_json::to_string_pretty(&unique_snapshot)
            .map_err(|e| AppError::Internal(format!("Snapshot serialization error: {}", e)))?;
        let complete_json = serde_json::to_string_pretty(&complete_snapshot)
            .map_err(|e| AppError::Internal(format!("Snapshot serialization error: {}", e)))?;

        self.store
            .save(&ListKey::Unique(self.list_name.clone()), &unique_json)
            .await?;
        self.store
            .save(&ListKey::Complete(self.list_name.clone()), &complete_json)
            .await?;

        tracing::info!(store = self.store.name(), "Movie lists saved");
        Ok(())
    }

    /// Fetches a movie and reports every conflict with the unique list
    pub async fn check_movie(&self, uri_or_title: &str) -> AppResult<MovieCheck> {
        let movie = self.provider.fetch_movie(uri_or_title).await?;
        Ok(self.check(movie).await)
    }

    async fn check(&self, movie: Movie) -> MovieCheck {
        let conflicts = self.unique.read().await.find_conflicts(&movie);
        MovieCheck { movie, conflicts }
    }

    /// Fetches a movie and adds it to the unique list
    pub async fn add_to_unique(&self, uri_or_title: &str, force_replace: bool) -> AppResult<AddOutcome> {
        let movie = self.provider.fetch_movie(uri_or_title).await?;
        self.add_movie_to_unique(movie, force_replace).await
    }

    /// Adds an already fetched movie to the unique list
    #[instrument(skip(self, movie), fields(uri = %movie.uri))]
    pub async fn add_movie_to_unique(&self, movie: Movie, force_replace: bool) -> AppResult<AddOutcome> {
        let outcome = self.unique.write().await.add(movie, force_replace);

        match &outcome {
            Ok(AddOutcome::Replaced { evicted }) => {
                tracing::info!(evicted = ?evicted, "Movie added, replacing blocking entries")
            }
            Ok(_) => tracing::info!("Movie added"),
            Err(e) => tracing::info!(conflicts = e.conflicts().len(), "Movie not added"),
        }

        outcome
    }

    pub async fn remove_from_unique(&self, uri: &str) -> AppResult<Movie> {
        let removed = self.unique.write().await.remove(uri)?;
        tracing::info!(uri = %uri, "Movie removed from unique list");
        Ok(removed)
    }

    /// Marks a movie as seen on the complete list
    pub async fn record_seen(&self, uri: &str, title: Option<&str>) {
        self.complete.write().await.add_movie(uri, title);
    }

    /// Marks a movie as not interesting
    pub async fn ignore(&self, uri: &str, title: Option<&str>) {
        self.complete.write().await.ignore_movie(uri, title);
    }

    /// Takes a movie off the ignored set; returns whether it was ignored
    pub async fn unignore(&self, uri: &str) -> bool {
        self.complete.write().await.unignore_movie(uri)
    }

    pub async fn acknowledge(&self, contributor: &str) {
        self.complete.write().await.acknowledge_cast_member(contributor);
    }

    /// Rates a seen movie: 1 to 5, or -1 for "not a movie"
    pub async fn rate(&self, uri: &str, rating: i32) -> AppResult<()> {
        let valid = rating == complete::NOT_A_MOVIE
            || (complete::MIN_RATING..=complete::MAX_RATING).contains(&rating);
        if !valid {
            return Err(AppError::InvalidInput(format!(
                "Rating must be {}..={} or {}, got {}",
                complete::MIN_RATING,
                complete::MAX_RATING,
                complete::NOT_A_MOVIE,
                rating
            )));
        }

        let mut complete = self.complete.write().await;
        if !complete.has(uri) {
            return Err(AppError::NotFound(format!("{} is not on the complete list", uri)));
        }
        complete.rate_movie(uri, rating);
        Ok(())
    }

    pub async fn unrated_movies(&self) -> Vec<String> {
        self.complete
            .read()
            .await
            .unrated_movies()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    /// Which frequent contributors among seen movies the unique list lacks
    #[instrument(skip(self), fields(list = %self.list_name))]
    pub async fn coverage_report(&self) -> AppResult<CoverageReport> {
        let seen: Vec<String> = self
            .complete
            .read()
            .await
            .movies()
            .map(|(uri, _)| uri.to_string())
            .collect();

        if seen.is_empty() {
            return Ok(CoverageReport::default());
        }

        let reviewed = self.provider.fetch_movies_batch(seen).await?;
        let report = coverage::build_report(&reviewed, &*self.unique.read().await);

        tracing::info!(
            movies_examined = report.movies_examined,
            contributors = report.contributors.len(),
            uncovered = report.uncovered().count(),
            "Coverage report built"
        );

        Ok(report)
    }

    /// Resolves a name to contributor URIs for [`candidates_for`](Self::candidates_for)
    pub async fn search_people(&self, name: &str) -> AppResult<Vec<PersonSearchResult>> {
        self.provider.search_people(name).await
    }

    /// Seen movies crediting `contributor`, each checked against the unique list
    #[instrument(skip(self))]
    pub async fn candidates_for(&self, contributor: &str) -> AppResult<Vec<MovieCheck>> {
        let films = providers::fetch_all_films(self.provider.as_ref(), contributor).await?;

        let seen: Vec<String> = {
            let complete = self.complete.read().await;
            films.into_iter().filter(|uri| complete.has(uri)).collect()
        };

        if seen.is_empty() {
            return Ok(Vec::new());
        }

        let movies = self.provider.fetch_movies_batch(seen).await?;
        let unique = self.unique.read().await;

        Ok(movies
            .into_iter()
            .map(|movie| MovieCheck {
                conflicts: unique.find_conflicts(&movie),
                movie,
            })
            .collect())
    }
}
