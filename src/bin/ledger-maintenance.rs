//! Batch runner for whole-season standings maintenance against the MongoDB store.
//!
//! `LEDGER_TASK` selects `recalculate` or `archive`; `SEASON_ID` names the season.

use std::{env, sync::Arc};

use anyhow::{Context, bail};
use tracing::info;
use volley_league_back::{
    config::AppConfig,
    dao::league_store::mongodb::{MongoConfig, MongoLeagueStore},
    init_tracing,
    services::{archive_service, recalculation},
    state::AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing().context("installing tracing subscriber")?;

    let task = env::var("LEDGER_TASK").context("LEDGER_TASK is not set")?;
    let season_id: i64 = env::var("SEASON_ID")
        .context("SEASON_ID is not set")?
        .parse()
        .context("SEASON_ID must be an integer")?;

    let mongo_config = MongoConfig::from_env()
        .await
        .context("reading MongoDB settings")?;
    let store = MongoLeagueStore::connect(mongo_config)
        .await
        .context("connecting to MongoDB")?;
    let state = AppState::new(Arc::new(store), AppConfig::load());

    info!(task = %task, season_id, "running ledger maintenance");
    let report = match task.as_str() {
        "recalculate" => serde_json::to_string_pretty(
            &recalculation::recalculate_standings(&state, season_id)
                .await
                .context("recalculating standings")?,
        ),
        "archive" => serde_json::to_string_pretty(
            &archive_service::archive_season(&state, season_id)
                .await
                .context("archiving season")?,
        ),
        other => bail!("unknown LEDGER_TASK `{other}`; expected `recalculate` or `archive`"),
    }
    .context("serializing report")?;

    println!("{report}");
    Ok(())
}
