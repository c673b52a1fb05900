// Expense Tracker - Store Errors
// Validation and not-found failures are client errors; anything else is a store
// failure the HTTP boundary reports as a generic server error

use thiserror::Error;

use crate::schema::ValidationError;

/// Result type alias for store and service operations.
pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    /// A required field is missing or a field holds an invalid value.
    /// Nothing was written.
    #[error("Validation failed: {}", join_validation_errors(.0))]
    Validation(Vec<ValidationError>),

    /// No entry with this id exists.
    #[error("Entry not found: {0}")]
    NotFound(String),

    /// The connection mutex was poisoned by a panicking holder.
    #[error("Store connection is unavailable")]
    LockPoisoned,

    /// Underlying SQLite error.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
}

impl StoreError {
    pub fn is_client_error(&self) -> bool {
        matches!(self, StoreError::Validation(_) | StoreError::NotFound(_))
    }
}

fn join_validation_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_message_lists_every_field() {
        let err = StoreError::Validation(vec![
            ValidationError::required("amount"),
            ValidationError::required("date"),
        ]);

        assert_eq!(
            err.to_string(),
            "Validation failed: amount: is required; date: is required"
        );
        assert!(err.is_client_error());
    }

    #[test]
    fn test_database_error_is_not_client_error() {
        let err = StoreError::from(rusqlite::Error::InvalidQuery);
        assert!(!err.is_client_error());
        assert!(!StoreError::LockPoisoned.is_client_error());
        assert!(StoreError::NotFound("abc".into()).is_client_error());
    }
}
