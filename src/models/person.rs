use serde::{Deserialize, Serialize};

/// A contributor search hit, resolved to a knowledge-graph resource
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PersonSearchResult {
    /// Contributor URI, usable with filmography lookups
    pub uri: String,
    /// Encyclopedia page title
    pub name: String,
}
