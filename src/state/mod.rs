use std::sync::Arc;

use crate::{
    config::AppConfig,
    dao::league_store::{LeagueStore, LeagueTransaction},
    error::ServiceError,
};

pub type SharedState = Arc<AppState>;

/// Central application state holding the store handle and the loaded configuration.
pub struct AppState {
    store: Arc<dyn LeagueStore>,
    config: AppConfig,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    pub fn new(store: Arc<dyn LeagueStore>, config: AppConfig) -> SharedState {
        Arc::new(Self { store, config })
    }

    pub fn store(&self) -> &Arc<dyn LeagueStore> {
        &self.store
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Open a store transaction, mapping backend failures into [`ServiceError`].
    pub async fn begin(&self) -> Result<Box<dyn LeagueTransaction>, ServiceError> {
        Ok(self.store.begin().await?)
    }
}
