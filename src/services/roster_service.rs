use time::Date;
use tracing::{info, warn};

use crate::{
    dao::models::{SeasonId, SeasonTeamEntity, StandingEntity, TeamId},
    dto::roster::RegisteredTeam,
    error::ServiceError,
    services::lifecycle::require_active_season,
    state::SharedState,
};

/// Add a team to a season's roster and open its zeroed standing record.
pub async fn register_team(
    state: &SharedState,
    season_id: SeasonId,
    team_id: TeamId,
    joined_on: Date,
) -> Result<RegisteredTeam, ServiceError> {
    let mut tx = state.begin().await?;
    require_active_season(tx.as_mut(), season_id, "register teams").await?;

    let Some(team) = tx.find_team(team_id).await? else {
        return Err(ServiceError::NotFound(format!("team `{team_id}` not found")));
    };
    if tx.find_season_team(season_id, team_id).await?.is_some() {
        warn!(season_id, team_id, "team already registered");
        return Err(ServiceError::Conflict(format!(
            "team `{team_id}` is already registered in season `{season_id}`"
        )));
    }

    tx.insert_season_team(SeasonTeamEntity {
        season_id,
        team_id,
        joined_on,
    })
    .await?;
    tx.insert_standing(StandingEntity::zeroed(season_id, team_id))
        .await?;
    tx.commit().await?;

    info!(season_id, team_id, %joined_on, "team registered");
    Ok(RegisteredTeam {
        season_id,
        team_id,
        team_name: team.name,
        joined_on,
    })
}
