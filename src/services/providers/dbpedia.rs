//! DBpedia metadata provider
//!
//! Queries the DBpedia SPARQL endpoint over HTTP (JSON results format).
//!
//! Lookups:
//! 1. Title search: films whose English `rdfs:label` contains the query
//! 2. Movie details: label plus `dbo:director`, `dbo:writer`, `dbo:starring`
//! 3. Filmography: films pointing at a contributor through one of those predicates
use crate::{
    cached,
    db::{Cache, CacheKey},
    error::{AppError, AppResult},
    models::{uri_label, Filmography, Movie, MovieSearchResult, PersonSearchResult, Role},
    services::providers::MetadataProvider,
};
use chrono::Utc;
use reqwest::Client as HttpClient;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;

const RESOURCE_PREFIX: &str = "http://dbpedia.org/resource/";
const DEFAULT_PEOPLE_SEARCH_API: &str = "https://en.wikipedia.org/w/api.php";

/// SPARQL JSON results document
#[derive(Debug, Deserialize)]
struct SparqlResponse {
    results: SparqlResults,
}

#[derive(Debug, Deserialize)]
struct SparqlResults {
    bindings: Vec<HashMap<String, SparqlValue>>,
}

#[derive(Debug, Deserialize)]
struct SparqlValue {
    value: String,
}

/// MediaWiki `list=search` response; DBpedia resources share page titles
#[derive(Debug, Default, Deserialize)]
struct WikiSearchResponse {
    #[serde(default)]
    query: WikiQuery,
}

#[derive(Debug, Default, Deserialize)]
struct WikiQuery {
    #[serde(default)]
    search: Vec<WikiPage>,
}

#[derive(Debug, Deserialize)]
struct WikiPage {
    title: String,
}

/// Hand-maintained corrections applied on top of fetched movie data
#[derive(Debug, Default, Deserialize)]
struct MovieOverride {
    title: Option<String>,
    directors: Option<Vec<String>>,
    writers: Option<Vec<String>>,
    actors: Option<Vec<String>>,
}

impl MovieOverride {
    fn apply(self, movie: &mut Movie) {
        if let Some(title) = self.title {
            movie.title = title;
        }
        if let Some(directors) = self.directors {
            movie.directors = directors;
        }
        if let Some(writers) = self.writers {
            movie.writers = writers;
        }
        if let Some(actors) = self.actors {
            movie.actors = actors;
        }
    }
}

#[derive(Clone)]
pub struct DbpediaProvider {
    http_client: HttpClient,
    endpoint: String,
    people_search_api: String,
    cache: Option<Cache>,
    overrides_dir: Option<PathBuf>,
}

impl DbpediaProvider {
    pub fn new(endpoint: String, cache: Option<Cache>, overrides_dir: Option<PathBuf>) -> Self {
        Self {
            http_client: HttpClient::new(),
            endpoint,
            people_search_api: DEFAULT_PEOPLE_SEARCH_API.to_string(),
            cache,
            overrides_dir,
        }
    }

    /// Use another MediaWiki API for name lookups
    pub fn with_people_search_api(mut self, url: impl Into<String>) -> Self {
        self.people_search_api = url.into();
        self
    }

    fn predicate(role: Role) -> &'static str {
        match role {
            Role::Director => "dbo:director",
            Role::Writer => "dbo:writer",
            Role::Actor => "dbo:starring",
        }
    }

    /// URIs are spliced into queries between angle brackets, where SPARQL
    /// forbids whitespace and a handful of punctuation characters
    fn validate_uri(uri: &str) -> AppResult<()> {
        let well_formed = (uri.starts_with("http://") || uri.starts_with("https://"))
            && !uri.chars().any(|c| {
                c.is_whitespace() || matches!(c, '<' | '>' | '"' | '{' | '}' | '|' | '^' | '`' | '\\')
            });
        if well_formed {
            Ok(())
        } else {
            Err(AppError::InvalidInput(format!("Not a resource URI: {}", uri)))
        }
    }

    fn escape_literal(text: &str) -> String {
        text.replace('\\', "\\\\").replace('"', "\\\"")
    }

    fn search_query(title: &str) -> String {
        format!(
            r#"PREFIX rdfs: <http://www.w3.org/2000/01/rdf-schema#>
PREFIX dbo: <http://dbpedia.org/ontology/>
SELECT ?movie ?title
WHERE {{
    ?movie a dbo:Film ;
        rdfs:label ?title .
    FILTER (lang(?title) = 'en')
    FILTER (contains(lcase(?title), "{}"))
}}"#,
            Self::escape_literal(&title.to_lowercase())
        )
    }

    fn label_query(uri: &str) -> String {
        format!(
            r#"PREFIX rdfs: <http://www.w3.org/2000/01/rdf-schema#>
SELECT ?label
WHERE {{
    <{}> rdfs:label ?label .
    FILTER (lang(?label) = 'en')
}}"#,
            uri
        )
    }

    fn credits_query(movie_uri: &str, role: Role) -> String {
        format!(
            r#"PREFIX dbo: <http://dbpedia.org/ontology/>
SELECT ?contributor
WHERE {{
    <{}> {} ?contributor .
}}"#,
            movie_uri,
            Self::predicate(role)
        )
    }

    fn filmography_query(contributor: &str, role: Role) -> String {
        format!(
            r#"PREFIX dbo: <http://dbpedia.org/ontology/>
SELECT ?movie
WHERE {{
    ?movie {} <{}> .
}}"#,
            Self::predicate(role),
            contributor
        )
    }

    /// Values bound to `var`, in result order, skipping repeats
    fn binding_values(response: SparqlResponse, var: &str) -> Vec<String> {
        let mut values: Vec<String> = Vec::new();
        for mut binding in response.results.bindings {
            if let Some(v) = binding.remove(var) {
                if !values.contains(&v.value) {
                    values.push(v.value);
                }
            }
        }
        values
    }

    /// File name for a movie's override: the resource path with `/` replaced
    fn override_file_name(movie_uri: &str) -> String {
        let id = movie_uri.strip_prefix(RESOURCE_PREFIX).unwrap_or(movie_uri);
        format!("{}.json", id.replace('/', "_"))
    }

    async fn run_query(&self, query: &str) -> AppResult<SparqlResponse> {
        let response = self
            .http_client
            .get(&self.endpoint)
            .query(&[("format", "json"), ("query", query)])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ProviderUnavailable(format!(
                "SPARQL endpoint returned status {}: {}",
                status, body
            )));
        }

        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| {
            tracing::error!(error = %e, "Failed to deserialize SPARQL response");
            AppError::ProviderUnavailable(format!("Malformed SPARQL response: {}", e))
        })
    }

    async fn fetch_label(&self, uri: &str) -> AppResult<Option<String>> {
        let response = self.run_query(&Self::label_query(uri)).await?;
        Ok(Self::binding_values(response, "label").into_iter().next())
    }

    async fn fetch_credits(&self, movie_uri: &str, role: Role) -> AppResult<Vec<String>> {
        let response = self
            .run_query(&Self::credits_query(movie_uri, role))
            .await?;
        Ok(Self::binding_values(response, "contributor"))
    }

    async fn fetch_movie_by_uri(&self, uri: &str) -> AppResult<Movie> {
        Self::validate_uri(uri)?;

        let movie: Movie = cached!(
            self.cache,
            CacheKey::MovieDetails(uri.to_string()),
            async {
                let (label, directors, writers, actors) = tokio::try_join!(
                    self.fetch_label(uri),
                    self.fetch_credits(uri, Role::Director),
                    self.fetch_credits(uri, Role::Writer),
                    self.fetch_credits(uri, Role::Actor),
                )?;

                let Some(title) = label else {
                    return Err(AppError::NotFound(format!("No knowledge-graph entry for {}", uri)));
                };

                tracing::info!(
                    uri = %uri,
                    directors = directors.len(),
                    writers = writers.len(),
                    actors = actors.len(),
                    provider = "dbpedia",
                    "Movie details fetched"
                );

                Ok::<_, AppError>(Movie {
                    uri: uri.to_string(),
                    title,
                    directors,
                    writers,
                    actors,
                })
            }
        )?;

        self.apply_override(movie).await
    }

    async fn apply_override(&self, mut movie: Movie) -> AppResult<Movie> {
        let Some(dir) = &self.overrides_dir else {
            return Ok(movie);
        };

        let path = dir.join(Self::override_file_name(&movie.uri));
        let contents = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(movie),
            Err(e) => return Err(e.into()),
        };

        let overrides: MovieOverride = serde_json::from_str(&contents).map_err(|e| {
            AppError::InvalidInput(format!("Bad override file {}: {}", path.display(), e))
        })?;
        overrides.apply(&mut movie);

        tracing::debug!(uri = %movie.uri, path = %path.display(), "Applied movie override");
        Ok(movie)
    }

    /// Page titles as resource URIs, dropping any that could not be queried
    fn people_from_search(response: WikiSearchResponse) -> Vec<PersonSearchResult> {
        response
            .query
            .search
            .into_iter()
            .filter_map(|page| {
                let uri = format!("{}{}", RESOURCE_PREFIX, page.title.replace(' ', "_"));
                Self::validate_uri(&uri).ok()?;
                Some(PersonSearchResult {
                    uri,
                    name: page.title,
                })
            })
            .collect()
    }

    async fn run_people_search(&self, query: &str) -> AppResult<WikiSearchResponse> {
        let response = self
            .http_client
            .get(&self.people_search_api)
            .query(&[
                ("action", "query"),
                ("format", "json"),
                ("list", "search"),
                ("srsearch", query),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AppError::ProviderUnavailable(format!(
                "People search returned status {}",
                response.status()
            )));
        }

        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| {
            tracing::error!(error = %e, "Failed to deserialize people search response");
            AppError::ProviderUnavailable(format!("Malformed people search response: {}", e))
        })
    }

    /// Best search hit: an exact (case-insensitive) title match, else the first
    fn pick_search_hit(query: &str, hits: Vec<MovieSearchResult>) -> Option<MovieSearchResult> {
        let wanted = query.trim().to_lowercase();
        let exact = hits.iter().position(|hit| hit.title.to_lowercase() == wanted);
        match exact {
            Some(i) => hits.into_iter().nth(i),
            None => hits.into_iter().next(),
        }
    }
}

#[async_trait::async_trait]
impl MetadataProvider for DbpediaProvider {
    async fn search_titles(&self, query: &str) -> AppResult<Vec<MovieSearchResult>> {
        if query.trim().is_empty() {
            return Err(AppError::InvalidInput(
                "Search query cannot be empty".to_string(),
            ));
        }

        cached!(
            self.cache,
            CacheKey::TitleSearch(query.to_string()),
            async move {
                let response = self.run_query(&Self::search_query(query.trim())).await?;

                let results: Vec<MovieSearchResult> = response
                    .results
                    .bindings
                    .into_iter()
                    .filter_map(|mut binding| {
                        let uri = binding.remove("movie")?.value;
                        let title = binding.remove("title")?.value;
                        Some(MovieSearchResult { uri, title })
                    })
                    .collect();

                tracing::info!(
                    query = %query,
                    results = results.len(),
                    provider = "dbpedia",
                    "Title search completed"
                );

                Ok::<_, AppError>(results)
            }
        )
    }

    async fn search_people(&self, query: &str) -> AppResult<Vec<PersonSearchResult>> {
        let query = query.trim();
        if query.is_empty() {
            return Err(AppError::InvalidInput(
                "Search query cannot be empty".to_string(),
            ));
        }

        cached!(
            self.cache,
            CacheKey::PersonSearch(query.to_string()),
            async move {
                let people = Self::people_from_search(self.run_people_search(query).await?);

                tracing::info!(
                    query = %query,
                    results = people.len(),
                    provider = "dbpedia",
                    "People search completed"
                );

                Ok::<_, AppError>(people)
            }
        )
    }

    async fn fetch_movie(&self, uri_or_title: &str) -> AppResult<Movie> {
        let query = uri_or_title.trim();
        if Self::validate_uri(query).is_ok() {
            return self.fetch_movie_by_uri(query).await;
        }

        let hits = self.search_titles(query).await?;
        let hit = Self::pick_search_hit(query, hits)
            .ok_or_else(|| AppError::NotFound(format!("No movie titled '{}'", query)))?;

        let mut movie = self.fetch_movie_by_uri(&hit.uri).await?;
        if movie.title.is_empty() {
            movie.title = hit.title;
        }
        Ok(movie)
    }

    async fn fetch_filmography(&self, contributor: &str, role: Role) -> AppResult<Filmography> {
        Self::validate_uri(contributor)?;

        cached!(
            self.cache,
            CacheKey::Filmography(role, contributor.to_string()),
            async {
                let (label, movies) = tokio::try_join!(
                    self.fetch_label(contributor),
                    async {
                        let response = self
                            .run_query(&Self::filmography_query(contributor, role))
                            .await?;
                        Ok::<_, AppError>(Self::binding_values(response, "movie"))
                    },
                )?;

                tracing::info!(
                    contributor = %contributor,
                    role = %role,
                    movies = movies.len(),
                    provider = "dbpedia",
                    "Filmography fetched"
                );

                Ok::<_, AppError>(Filmography {
                    uri: contributor.to_string(),
                    label: label.unwrap_or_else(|| uri_label(contributor).replace('_', " ")),
                    role,
                    movies,
                    fetched_at: Utc::now(),
                })
            }
        )
    }

    fn clone_for_task(&self) -> Box<dyn MetadataProvider> {
        Box::new(self.clone())
    }

    fn name(&self) -> &'static str {
        "dbpedia"
    }
}
