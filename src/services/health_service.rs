use tracing::warn;

use crate::{dto::health::HealthResponse, state::SharedState};

/// Report whether the league store answers, logging connectivity issues.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    match state.store().health_check().await {
        Ok(()) => HealthResponse::ok(),
        Err(err) => {
            warn!(error = %err, "storage health check failed");
            HealthResponse::degraded()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{config::AppConfig, dao::league_store::memory::MemoryLeagueStore, state::AppState};

    #[tokio::test]
    async fn memory_store_is_healthy() {
        let state = AppState::new(Arc::new(MemoryLeagueStore::new()), AppConfig::default());
        assert_eq!(health_status(&state).await, HealthResponse::ok());
    }
}
