use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Role;

/// Movies a contributor is credited on in one role
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Filmography {
    /// Contributor URI
    pub uri: String,
    /// English label from the knowledge graph
    pub label: String,
    pub role: Role,
    /// Movie URIs
    pub movies: Vec<String>,
    pub fetched_at: DateTime<Utc>,
}
