use thiserror::Error;
use validator::ValidationErrors;

use crate::dao::storage::StorageError;

/// Errors that can occur in service layer operations.
///
/// Every variant is surfaced whole to the caller; the transaction that was open when it
/// occurred has already been rolled back.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Storage backend is unavailable or rejected the transaction.
    #[error("storage unavailable")]
    Unavailable(#[source] StorageError),
    /// Malformed scheduling parameters, rejected before any work starts.
    #[error("invalid configuration: {0}")]
    Configuration(String),
    /// Requested season, team, or match does not exist.
    #[error("not found: {0}")]
    NotFound(String),
    /// Operation is not valid for the current lifecycle of the target.
    #[error("invalid state: {0}")]
    InvalidState(String),
    /// Operation would duplicate data that already exists.
    #[error("conflict: {0}")]
    Conflict(String),
}

impl From<StorageError> for ServiceError {
    fn from(err: StorageError) -> Self {
        ServiceError::Unavailable(err)
    }
}

impl From<ValidationErrors> for ServiceError {
    fn from(err: ValidationErrors) -> Self {
        ServiceError::Configuration(format!("validation failed: {err}"))
    }
}

impl ServiceError {
    /// Whether the caller may retry the same operation unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ServiceError::Unavailable(source) if source.is_transient())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_contention_is_retryable() {
        let contention = ServiceError::from(StorageError::Contention {
            message: "write conflict".into(),
        });
        assert!(contention.is_retryable());

        let corrupted = ServiceError::from(StorageError::corrupted("matches", "bad status"));
        assert!(!corrupted.is_retryable());
        assert!(!ServiceError::InvalidState("already processed".into()).is_retryable());
    }

    #[test]
    fn validation_errors_become_configuration_errors() {
        let mut errors = ValidationErrors::new();
        errors.add("period_weeks", validator::ValidationError::new("range"));
        let err = ServiceError::from(errors);
        assert!(matches!(err, ServiceError::Configuration(message) if message.contains("period_weeks")));
    }
}
