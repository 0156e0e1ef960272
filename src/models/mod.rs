use serde::{Deserialize, Serialize};
use std::fmt::Display;

pub mod filmography;
pub mod movie;
pub mod person;

pub use filmography::Filmography;
pub use movie::{Movie, MovieSearchResult};
pub use person::PersonSearchResult;

/// The capacity in which a contributor is credited on a movie
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Director,
    Writer,
    Actor,
}

impl Role {
    /// Every role, in conflict-reporting order
    pub const ALL: [Role; 3] = [Role::Director, Role::Writer, Role::Actor];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Director => "director",
            Role::Writer => "writer",
            Role::Actor => "actor",
        }
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Why a movie cannot join the unique list: `contributor` is already
/// credited in `role` on `blocking_movie`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conflict {
    pub role: Role,
    pub contributor: String,
    pub blocking_movie: String,
}

impl Display for Conflict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} already used in {}",
            self.role,
            uri_label(&self.contributor),
            uri_label(&self.blocking_movie)
        )
    }
}

/// Last path segment of a URI, used as a display label when none is known
pub fn uri_label(uri: &str) -> &str {
    uri.rsplit('/').next().unwrap_or(uri)
}

/// Markdown link to a knowledge-graph resource
pub fn markdown_link(uri: &str, label: Option<&str>) -> String {
    format!("[{}]({})", label.unwrap_or_else(|| uri_label(uri)), uri)
}
