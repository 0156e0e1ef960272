use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::{
    error::{AppError, AppResult},
    models::uri_label,
};

/// Rating meaning "not actually a movie, don't ask again"
pub const NOT_A_MOVIE: i32 = -1;
pub const MIN_RATING: i32 = 1;
pub const MAX_RATING: i32 = 5;

/// Persisted shape of a [`CompleteMovieList`]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct CompleteListSnapshot {
    pub movies: Vec<String>,
    #[serde(default)]
    pub not_movies: Vec<String>,
    pub cast_covered: BTreeMap<String, bool>,
    #[serde(default)]
    pub ratings: BTreeMap<String, i32>,
}

/// URI → title map that remembers insertion order
#[derive(Debug, Clone, Default)]
struct TitledSet {
    titles: HashMap<String, String>,
    order: Vec<String>,
}

impl TitledSet {
    fn insert(&mut self, uri: &str, title: String) {
        if self.titles.insert(uri.to_string(), title).is_none() {
            self.order.push(uri.to_string());
        }
    }

    fn remove(&mut self, uri: &str) -> bool {
        if self.titles.remove(uri).is_some() {
            self.order.retain(|listed| listed != uri);
            true
        } else {
            false
        }
    }

    fn contains(&self, uri: &str) -> bool {
        self.titles.contains_key(uri)
    }

    fn iter(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.order
            .iter()
            .filter_map(|uri| self.titles.get(uri).map(|t| (uri.as_str(), t.as_str())))
    }

    fn len(&self) -> usize {
        self.titles.len()
    }
}

/// Movies the user has reviewed, with no uniqueness constraint.
///
/// A URI is either on the list or ignored, never both.
#[derive(Debug, Clone, Default)]
pub struct CompleteMovieList {
    movies: TitledSet,
    ignored: TitledSet,
    acknowledged_cast: BTreeSet<String>,
    ratings: BTreeMap<String, i32>,
}

impl CompleteMovieList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a list from its snapshot, re-applying exclusivity
    pub fn from_snapshot(snapshot: CompleteListSnapshot) -> Self {
        let mut list = Self::new();
        for uri in &snapshot.movies {
            list.add_movie(uri, None);
        }
        for uri in &snapshot.not_movies {
            list.ignore_movie(uri, None);
        }
        list.acknowledged_cast = snapshot.cast_covered.into_keys().collect();
        list.ratings = snapshot.ratings;
        list
    }

    /// Parses and rebuilds a list from serialized JSON
    pub fn from_json(list_name: &str, json: &str) -> AppResult<Self> {
        let snapshot: CompleteListSnapshot =
            serde_json::from_str(json).map_err(|e| AppError::CorruptSnapshot {
                list: list_name.to_string(),
                reason: e.to_string(),
            })?;
        Ok(Self::from_snapshot(snapshot))
    }

    pub fn to_snapshot(&self) -> CompleteListSnapshot {
        CompleteListSnapshot {
            movies: self.movies.iter().map(|(uri, _)| uri.to_string()).collect(),
            not_movies: self.ignored.iter().map(|(uri, _)| uri.to_string()).collect(),
            cast_covered: self
                .acknowledged_cast
                .iter()
                .map(|uri| (uri.clone(), true))
                .collect(),
            ratings: self.ratings.clone(),
        }
    }

    /// Adds a movie, un-ignoring it. The title defaults to the URI's last segment.
    pub fn add_movie(&mut self, uri: &str, title: Option<&str>) {
        self.ignored.remove(uri);
        let title = title.unwrap_or_else(|| uri_label(uri)).to_string();
        self.movies.insert(uri, title);
    }

    /// Marks a movie as not interesting, taking it off the list
    pub fn ignore_movie(&mut self, uri: &str, title: Option<&str>) {
        self.movies.remove(uri);
        let title = title.unwrap_or_else(|| uri_label(uri)).to_string();
        self.ignored.insert(uri, title);
    }

    /// Returns whether the movie was ignored
    pub fn unignore_movie(&mut self, uri: &str) -> bool {
        self.ignored.remove(uri)
    }

    /// Takes a movie off the list without ignoring it; returns whether it was listed
    pub fn remove_movie(&mut self, uri: &str) -> bool {
        self.movies.remove(uri)
    }

    pub fn has(&self, uri: &str) -> bool {
        self.movies.contains(uri)
    }

    pub fn is_ignored(&self, uri: &str) -> bool {
        self.ignored.contains(uri)
    }

    pub fn acknowledge_cast_member(&mut self, uri: &str) {
        self.acknowledged_cast.insert(uri.to_string());
    }

    pub fn is_cast_member_acknowledged(&self, uri: &str) -> bool {
        self.acknowledged_cast.contains(uri)
    }

    /// Records a rating. Any value is accepted; callers validate if they care.
    pub fn rate_movie(&mut self, uri: &str, rating: i32) {
        self.ratings.insert(uri.to_string(), rating);
    }

    pub fn rating(&self, uri: &str) -> Option<i32> {
        self.ratings.get(uri).copied()
    }

    /// Listed movies with no rating, in insertion order
    pub fn unrated_movies(&self) -> Vec<&str> {
        self.movies
            .iter()
            .map(|(uri, _)| uri)
            .filter(|uri| !self.ratings.contains_key(*uri))
            .collect()
    }

    /// `(uri, title)` of listed movies in insertion order
    pub fn movies(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.movies.iter()
    }

    /// `(uri, title)` of ignored movies in insertion order
    pub fn ignored(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.ignored.iter()
    }

    pub fn ratings(&self) -> &BTreeMap<String, i32> {
        &self.ratings
    }

    pub fn len(&self) -> usize {
        self.movies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.movies.len() == 0
    }
}
