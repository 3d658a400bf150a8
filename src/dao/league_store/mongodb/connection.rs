use std::{iter, time::Duration};

use mongodb::{Client, Database, bson::doc};
use tokio::time::sleep;
use tracing::debug;

use super::{
    config::MongoConfig,
    error::{MongoDaoError, MongoResult},
};

/// Ping schedule followed while the server is still coming up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectRetry {
    /// Pings sent before giving up.
    pub attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

impl Default for ConnectRetry {
    fn default() -> Self {
        Self {
            attempts: 10,
            initial_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(5),
        }
    }
}

impl ConnectRetry {
    /// Waits between consecutive pings, doubling from `initial_delay` up to `max_delay`.
    pub fn delays(&self) -> impl Iterator<Item = Duration> + use<> {
        let max_delay = self.max_delay;
        let waits = self.attempts.saturating_sub(1) as usize;
        iter::successors(Some(self.initial_delay.min(max_delay)), move |wait| {
            Some(wait.saturating_mul(2).min(max_delay))
        })
        .take(waits)
    }
}

/// Build a client and wait until the configured database answers a ping.
pub async fn establish_connection(config: &MongoConfig) -> MongoResult<(Client, Database)> {
    let client = Client::with_options(config.options.clone())
        .map_err(|source| MongoDaoError::ClientConstruction { source })?;
    let database = client.database(&config.database_name);

    let mut waits = config.retry.delays();
    let mut attempt = 1;
    loop {
        let Err(source) = database.run_command(doc! { "ping": 1 }).await else {
            debug!(database = %config.database_name, attempt, "MongoDB answered ping");
            return Ok((client, database));
        };
        let Some(wait) = waits.next() else {
            return Err(MongoDaoError::InitialPing {
                attempts: attempt,
                source,
            });
        };
        debug!(
            attempt,
            wait_ms = wait.as_millis() as u64,
            error = %source,
            "MongoDB not ready yet"
        );
        sleep(wait).await;
        attempt += 1;
    }
}
