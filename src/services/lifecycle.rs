use tracing::warn;

use crate::{
    dao::{
        league_store::LeagueTransaction,
        models::{SeasonEntity, SeasonId},
    },
    error::ServiceError,
};

/// Load a season or fail with [`ServiceError::NotFound`].
pub(crate) async fn require_season(
    tx: &mut dyn LeagueTransaction,
    season_id: SeasonId,
) -> Result<SeasonEntity, ServiceError> {
    tx.find_season(season_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("season `{season_id}` not found")))
}

/// Load a season that can still be mutated.
pub(crate) async fn require_active_season(
    tx: &mut dyn LeagueTransaction,
    season_id: SeasonId,
    action: &str,
) -> Result<SeasonEntity, ServiceError> {
    let season = require_season(tx, season_id).await?;
    if season.archived {
        warn!(season_id, action, "rejected operation on archived season");
        return Err(ServiceError::InvalidState(format!(
            "season `{season_id}` is archived; cannot {action}"
        )));
    }
    Ok(season)
}
