use mongodb::error::{Error as MongoError, TRANSIENT_TRANSACTION_ERROR};
use thiserror::Error;

use crate::dao::storage::StorageError;

pub type MongoResult<T> = std::result::Result<T, MongoDaoError>;

#[derive(Debug, Error)]
pub enum MongoDaoError {
    #[error("missing environment variable `{var}`")]
    MissingEnvVar { var: &'static str },
    #[error("invalid value `{value}` for `{name}`")]
    InvalidSetting { name: &'static str, value: String },
    #[error("failed to parse MongoDB connection URI `{uri}`")]
    InvalidUri {
        uri: String,
        #[source]
        source: MongoError,
    },
    #[error("failed to build MongoDB client from options")]
    ClientConstruction {
        #[source]
        source: MongoError,
    },
    #[error("MongoDB ping failed during initial connection after {attempts} attempt(s)")]
    InitialPing {
        attempts: u32,
        #[source]
        source: MongoError,
    },
    #[error("MongoDB ping health check failed")]
    HealthPing {
        #[source]
        source: MongoError,
    },
    #[error("failed to ensure index `{index}` on collection `{collection}`")]
    EnsureIndex {
        collection: &'static str,
        index: &'static str,
        #[source]
        source: MongoError,
    },
    #[error("failed to start a transaction")]
    StartTransaction {
        #[source]
        source: MongoError,
    },
    #[error("failed to commit the transaction")]
    Commit {
        #[source]
        source: MongoError,
    },
    #[error("`{operation}` on collection `{collection}` failed")]
    Query {
        collection: &'static str,
        operation: &'static str,
        #[source]
        source: MongoError,
    },
    #[error("malformed document in `{collection}`: {message}")]
    Decode {
        collection: &'static str,
        message: String,
    },
}

impl MongoDaoError {
    pub fn query(collection: &'static str, operation: &'static str, source: MongoError) -> Self {
        MongoDaoError::Query {
            collection,
            operation,
            source,
        }
    }

    pub fn decode(collection: &'static str, message: impl Into<String>) -> Self {
        MongoDaoError::Decode {
            collection,
            message: message.into(),
        }
    }

    fn is_transient(&self) -> bool {
        match self {
            MongoDaoError::Query { source, .. } | MongoDaoError::Commit { source } => {
                source.contains_label(TRANSIENT_TRANSACTION_ERROR)
            }
            _ => false,
        }
    }
}

impl From<MongoDaoError> for StorageError {
    fn from(err: MongoDaoError) -> Self {
        if err.is_transient() {
            return StorageError::Contention {
                message: err.to_string(),
            };
        }
        match err {
            MongoDaoError::Decode {
                collection,
                message,
            } => StorageError::corrupted(collection, message),
            other => StorageError::unavailable(other.to_string(), other),
        }
    }
}
