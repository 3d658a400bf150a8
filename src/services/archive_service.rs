use time::OffsetDateTime;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    dao::models::{ArchivedStandingEntity, SeasonId},
    dto::standings::{ArchiveSummary, ArchivedStandings, RankedStanding},
    error::ServiceError,
    services::{lifecycle::require_season, standings_ledger::rank_standings},
    state::SharedState,
};

/// Snapshot the final ranked standings, clear the live ledger and close the season.
pub async fn archive_season(
    state: &SharedState,
    season_id: SeasonId,
) -> Result<ArchiveSummary, ServiceError> {
    let mut tx = state.begin().await?;
    let season = require_season(tx.as_mut(), season_id).await?;
    if season.archived {
        warn!(season_id, "season already archived");
        return Err(ServiceError::InvalidState(format!(
            "season `{season_id}` is already archived"
        )));
    }

    let standings = tx.season_standings(season_id).await?;
    if standings.is_empty() {
        return Err(ServiceError::InvalidState(format!(
            "season `{season_id}` has no standings to archive"
        )));
    }

    let archive_id = Uuid::new_v4();
    let archived_at = OffsetDateTime::now_utc();
    let rows: Vec<ArchivedStandingEntity> = rank_standings(standings)
        .into_iter()
        .map(|(rank, standing)| ArchivedStandingEntity {
            archive_id,
            rank,
            archived_at,
            standing,
        })
        .collect();
    let teams_archived = rows.len();

    tx.insert_archived_standings(rows).await?;
    tx.delete_season_standings(season_id).await?;
    tx.mark_season_archived(season_id).await?;
    tx.commit().await?;

    info!(season_id, %archive_id, teams_archived, "season archived");
    Ok(ArchiveSummary {
        season_id,
        archive_id,
        teams_archived,
        archived_at,
    })
}

/// Frozen table of an archived season, ordered by final rank.
pub async fn archived_standings(
    state: &SharedState,
    season_id: SeasonId,
) -> Result<ArchivedStandings, ServiceError> {
    let mut tx = state.begin().await?;
    require_season(tx.as_mut(), season_id).await?;
    let rows = tx.archived_standings(season_id).await?;

    let Some(first) = rows.first() else {
        return Err(ServiceError::NotFound(format!(
            "season `{season_id}` has no archived standings"
        )));
    };
    let (archive_id, archived_at) = (first.archive_id, first.archived_at);

    Ok(ArchivedStandings {
        season_id,
        archive_id,
        archived_at,
        standings: rows
            .iter()
            .map(|row| RankedStanding::new(row.rank, &row.standing))
            .collect(),
    })
}
