use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::Role;

/// A movie and the contributors credited on it
///
/// Serialized field names are the on-disk shape of a unique list snapshot entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Movie {
    /// Knowledge-graph URI (e.g., "http://dbpedia.org/resource/Fargo_(1996_film)")
    pub uri: String,
    /// Display title
    pub title: String,
    #[serde(default)]
    pub directors: Vec<String>,
    #[serde(default)]
    pub writers: Vec<String>,
    #[serde(default)]
    pub actors: Vec<String>,
}

impl Movie {
    /// Creates a movie with no credited contributors
    pub fn new(uri: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            title: title.into(),
            directors: Vec::new(),
            writers: Vec::new(),
            actors: Vec::new(),
        }
    }

    pub fn with_directors<I, S>(mut self, directors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.directors = directors.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_writers<I, S>(mut self, writers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.writers = writers.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_actors<I, S>(mut self, actors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.actors = actors.into_iter().map(Into::into).collect();
        self
    }

    /// Contributors credited in the given role, in record order
    pub fn credited(&self, role: Role) -> &[String] {
        match role {
            Role::Director => &self.directors,
            Role::Writer => &self.writers,
            Role::Actor => &self.actors,
        }
    }

    /// All contributors as `(role, uri)`: directors, then writers, then actors
    pub fn contributors(&self) -> impl Iterator<Item = (Role, &str)> + '_ {
        Role::ALL.into_iter().flat_map(move |role| {
            self.credited(role)
                .iter()
                .map(move |contributor| (role, contributor.as_str()))
        })
    }

    /// Same URI, title, and credits, ignoring the order credits are listed in
    pub fn same_record(&self, other: &Movie) -> bool {
        self.uri == other.uri
            && self.title == other.title
            && Role::ALL.into_iter().all(|role| {
                let ours: HashSet<&String> = self.credited(role).iter().collect();
                let theirs: HashSet<&String> = other.credited(role).iter().collect();
                ours == theirs
            })
    }
}

/// A title search hit from the metadata provider
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MovieSearchResult {
    pub uri: String,
    pub title: String,
}
