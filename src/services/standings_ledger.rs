use std::cmp::Reverse;

use tracing::debug;

use crate::{
    dao::{
        league_store::LeagueTransaction,
        models::{SeasonId, StandingDelta, StandingEntity, TeamId},
    },
    dto::standings::RankedStanding,
    error::ServiceError,
    services::lifecycle::require_season,
    state::SharedState,
};

/// Composite ranking key: league points, set difference and point difference descending,
/// then team id ascending. Sorting by it yields a total, backend-independent order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct StandingsOrder {
    league_points: Reverse<i64>,
    set_diff: Reverse<i64>,
    point_diff: Reverse<i64>,
    team_id: TeamId,
}

impl StandingsOrder {
    pub fn of(standing: &StandingEntity) -> Self {
        Self {
            league_points: Reverse(standing.league_points),
            set_diff: Reverse(standing.set_diff()),
            point_diff: Reverse(standing.point_diff()),
            team_id: standing.team_id,
        }
    }
}

/// Upsert the (season, team) record with the outcome of one processed match.
pub async fn apply_delta(
    tx: &mut dyn LeagueTransaction,
    season_id: SeasonId,
    team_id: TeamId,
    delta: StandingDelta,
) -> Result<StandingEntity, ServiceError> {
    let standing = tx.apply_standing_delta(season_id, team_id, delta).await?;
    debug!(
        season_id,
        team_id,
        matches_played = standing.matches_played,
        league_points = standing.league_points,
        "standing updated"
    );
    Ok(standing)
}

/// Sort standings into final order and attach 1-based ranks.
pub fn rank_standings(mut standings: Vec<StandingEntity>) -> Vec<(u32, StandingEntity)> {
    standings.sort_by_key(StandingsOrder::of);
    (1..).zip(standings).collect()
}

/// Ranked standings view of a season.
pub fn ranked_standings(standings: Vec<StandingEntity>) -> Vec<RankedStanding> {
    rank_standings(standings)
        .iter()
        .map(|(rank, standing)| RankedStanding::new(*rank, standing))
        .collect()
}

/// Current live table of a season.
pub async fn season_standings(
    state: &SharedState,
    season_id: SeasonId,
) -> Result<Vec<RankedStanding>, ServiceError> {
    let mut tx = state.begin().await?;
    require_season(tx.as_mut(), season_id).await?;
    let standings = tx.season_standings(season_id).await?;
    Ok(ranked_standings(standings))
}
