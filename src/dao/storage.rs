use std::error::Error;
use thiserror::Error;

/// Result alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Error raised by storage backends regardless of the underlying database.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage unavailable: {message}")]
    Unavailable {
        message: String,
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
    /// A concurrent transaction touched the same rows; the whole transaction was rolled back
    /// and may be retried by the caller.
    #[error("transaction aborted by a concurrent writer: {message}")]
    Contention { message: String },
    /// A persisted row could not be mapped back to its entity.
    #[error("corrupted record in `{collection}`: {message}")]
    Corrupted {
        collection: &'static str,
        message: String,
    },
}

impl StorageError {
    /// Construct an unavailable error from any backend failure.
    pub fn unavailable(message: String, source: impl Error + Send + Sync + 'static) -> Self {
        StorageError::Unavailable {
            message,
            source: Box::new(source),
        }
    }

    pub fn corrupted(collection: &'static str, message: impl Into<String>) -> Self {
        StorageError::Corrupted {
            collection,
            message: message.into(),
        }
    }

    /// Whether retrying the whole transaction could succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, StorageError::Contention { .. })
    }
}
