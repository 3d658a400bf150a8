use std::env;

use mongodb::options::ClientOptions;

use super::{
    connection::ConnectRetry,
    error::{MongoDaoError, MongoResult},
};

/// Database used when `MONGO_DB` is unset or blank.
pub const DEFAULT_DATABASE_NAME: &str = "volley_league";

const URI_VAR: &str = "MONGO_URI";
const DATABASE_VAR: &str = "MONGO_DB";
const ATTEMPTS_VAR: &str = "MONGO_CONNECT_ATTEMPTS";

/// Characters MongoDB refuses in database names.
const FORBIDDEN_NAME_CHARS: [char; 7] = ['/', '\\', '.', ' ', '"', '$', '\0'];
/// Database names must stay below this many bytes.
const MAX_NAME_BYTES: usize = 64;

/// Everything needed to reach the league database.
#[derive(Clone)]
pub struct MongoConfig {
    pub options: ClientOptions,
    pub database_name: String,
    pub retry: ConnectRetry,
}

impl MongoConfig {
    pub async fn from_uri(uri: &str, database_name: Option<&str>) -> MongoResult<Self> {
        let database_name = resolve_database_name(database_name)?;
        let options = ClientOptions::parse(uri)
            .await
            .map_err(|source| MongoDaoError::InvalidUri {
                uri: uri.to_owned(),
                source,
            })?;

        Ok(Self {
            options,
            database_name,
            retry: ConnectRetry::default(),
        })
    }

    pub fn with_retry(mut self, retry: ConnectRetry) -> Self {
        self.retry = retry;
        self
    }

    /// Read `MONGO_URI` (required), `MONGO_DB` and `MONGO_CONNECT_ATTEMPTS` (optional).
    pub async fn from_env() -> MongoResult<Self> {
        let uri = env::var(URI_VAR).map_err(|_| MongoDaoError::MissingEnvVar { var: URI_VAR })?;
        let config = Self::from_uri(&uri, env::var(DATABASE_VAR).ok().as_deref()).await?;

        match env::var(ATTEMPTS_VAR) {
            Ok(raw) => Ok(config.with_retry(ConnectRetry {
                attempts: parse_attempts(&raw)?,
                ..ConnectRetry::default()
            })),
            Err(_) => Ok(config),
        }
    }
}

/// Trimmed database name, falling back to [`DEFAULT_DATABASE_NAME`] when blank.
fn resolve_database_name(raw: Option<&str>) -> MongoResult<String> {
    let name = raw
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or(DEFAULT_DATABASE_NAME);
    if name.len() >= MAX_NAME_BYTES || name.contains(FORBIDDEN_NAME_CHARS) {
        return Err(MongoDaoError::InvalidSetting {
            name: DATABASE_VAR,
            value: name.to_owned(),
        });
    }
    Ok(name.to_owned())
}

fn parse_attempts(raw: &str) -> MongoResult<u32> {
    raw.trim()
        .parse::<u32>()
        .ok()
        .filter(|&attempts| attempts > 0)
        .ok_or_else(|| MongoDaoError::InvalidSetting {
            name: ATTEMPTS_VAR,
            value: raw.to_owned(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_or_missing_names_use_the_default() {
        assert_eq!(resolve_database_name(None).unwrap(), DEFAULT_DATABASE_NAME);
        assert_eq!(resolve_database_name(Some("   ")).unwrap(), DEFAULT_DATABASE_NAME);
        assert_eq!(
            resolve_database_name(Some(" league_test\n")).unwrap(),
            "league_test"
        );
    }

    #[test]
    fn names_mongodb_would_refuse_are_rejected() {
        let too_long = "x".repeat(MAX_NAME_BYTES);
        for bad in ["league.test", "a/b", "cash$", "two words", too_long.as_str()] {
            let err = resolve_database_name(Some(bad)).unwrap_err();
            assert!(
                matches!(err, MongoDaoError::InvalidSetting { name: DATABASE_VAR, .. }),
                "{bad}"
            );
        }
    }

    #[test]
    fn connect_attempts_must_be_positive() {
        assert_eq!(parse_attempts(" 3 ").unwrap(), 3);
        for bad in ["0", "-1", "many", ""] {
            assert!(parse_attempts(bad).is_err(), "{bad}");
        }
    }

    #[tokio::test]
    async fn uri_settings_carry_the_resolved_name() {
        let config = MongoConfig::from_uri("mongodb://localhost:27017", Some(" league_test "))
            .await
            .unwrap();
        assert_eq!(config.database_name, "league_test");
        assert_eq!(config.retry, ConnectRetry::default());

        let retry = ConnectRetry {
            attempts: 2,
            ..ConnectRetry::default()
        };
        assert_eq!(config.with_retry(retry).retry.attempts, 2);
    }

    #[tokio::test]
    async fn malformed_uri_is_reported() {
        let err = MongoConfig::from_uri("localhost:27017", None)
            .await
            .err()
            .unwrap();
        assert!(matches!(err, MongoDaoError::InvalidUri { .. }));
    }
}
