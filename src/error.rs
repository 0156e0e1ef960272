use crate::models::Conflict;

/// Application-level errors
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    /// The movie shares contributors with entries already on the unique list
    #[error("Cannot add {uri}: {} conflicting contributor(s)", conflicts.len())]
    ConstraintViolation {
        uri: String,
        conflicts: Vec<Conflict>,
    },

    #[error("Not found: {0}")]
    NotFound(String),

    /// The metadata provider failed; callers decide whether to retry
    #[error("Metadata provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// A persisted list failed to parse into the expected shape
    #[error("Corrupt snapshot for list '{list}': {reason}")]
    CorruptSnapshot { list: String, reason: String },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Cache error: {0}")]
    Cache(#[from] redis::RedisError),

    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<reqwest::Error> for AppError {
    fn from(e: reqwest::Error) -> Self {
        AppError::ProviderUnavailable(e.to_string())
    }
}

impl AppError {
    /// Conflicts carried by a constraint violation, empty for every other error
    pub fn conflicts(&self) -> &[Conflict] {
        match self {
            AppError::ConstraintViolation { conflicts, .. } => conflicts,
            _ => &[],
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, AppError::NotFound(_))
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;

    #[test]
    fn test_constraint_violation_message_counts_conflicts() {
        let err = AppError::ConstraintViolation {
            uri: "m/Fargo2".to_string(),
            conflicts: vec![Conflict {
                role: Role::Director,
                contributor: "Coens".to_string(),
                blocking_movie: "m/Fargo".to_string(),
            }],
        };
        assert_eq!(
            err.to_string(),
            "Cannot add m/Fargo2: 1 conflicting contributor(s)"
        );
        assert_eq!(err.conflicts().len(), 1);
    }

    #[test]
    fn test_conflicts_empty_for_other_errors() {
        let err = AppError::NotFound("m/Missing".to_string());
        assert!(err.conflicts().is_empty());
        assert!(err.is_not_found());
    }

    #[test]
    fn test_corrupt_snapshot_names_list() {
        let err = AppError::CorruptSnapshot {
            list: "favorites".to_string(),
            reason: "expected array".to_string(),
        };
        assert!(err.to_string().contains("favorites"));
    }
}
