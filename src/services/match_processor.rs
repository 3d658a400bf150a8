use tracing::{info, warn};

use crate::{
    dao::{
        league_store::LeagueTransaction,
        models::{MatchId, MatchStatus, SetEntity, StandingDelta},
    },
    dto::matches::{MatchProcessingResult, TeamStandingUpdate},
    error::ServiceError,
    services::{lifecycle::require_active_season, standings_ledger},
    state::SharedState,
};

/// League points for a won match.
pub const WIN_POINTS: i64 = 3;
/// League points for a lost match.
pub const LOSS_POINTS: i64 = 0;

/// Fold a finished match into the standings and mark it processed, atomically.
pub async fn process_match(
    state: &SharedState,
    match_id: MatchId,
) -> Result<MatchProcessingResult, ServiceError> {
    let mut tx = state.begin().await?;
    let result = process_in(tx.as_mut(), match_id).await?;
    tx.commit().await?;

    info!(
        match_id,
        season_id = result.season_id,
        winner_team_id = result.winner_team_id,
        "match processed"
    );
    Ok(result)
}

/// Processing body shared with season recalculation; runs inside the caller's transaction.
pub(crate) async fn process_in(
    tx: &mut dyn LeagueTransaction,
    match_id: MatchId,
) -> Result<MatchProcessingResult, ServiceError> {
    let Some(entity) = tx.find_match(match_id).await? else {
        return Err(ServiceError::NotFound(format!(
            "match `{match_id}` not found"
        )));
    };
    let Some(winner_team_id) = entity.winner_team_id else {
        return Err(ServiceError::InvalidState(format!(
            "match `{match_id}` has no winner recorded"
        )));
    };
    if entity.status != MatchStatus::Finished {
        warn!(match_id, status = entity.status.as_str(), "refusing to process match");
        return Err(ServiceError::InvalidState(format!(
            "match `{match_id}` is {}, expected FINISHED",
            entity.status.as_str()
        )));
    }
    if winner_team_id != entity.home_team_id && winner_team_id != entity.away_team_id {
        return Err(ServiceError::InvalidState(format!(
            "winner `{winner_team_id}` did not play match `{match_id}`"
        )));
    }
    require_active_season(tx, entity.season_id, "process matches").await?;

    let sets = tx.match_sets(match_id).await?;
    let (home_points, away_points) = point_totals(&sets);
    let home_won = winner_team_id == entity.home_team_id;

    let home_delta = side_delta(
        home_won,
        (entity.home_sets_won, entity.away_sets_won),
        (home_points, away_points),
    );
    let away_delta = side_delta(
        !home_won,
        (entity.away_sets_won, entity.home_sets_won),
        (away_points, home_points),
    );

    standings_ledger::apply_delta(tx, entity.season_id, entity.home_team_id, home_delta).await?;
    standings_ledger::apply_delta(tx, entity.season_id, entity.away_team_id, away_delta).await?;
    tx.set_match_status(match_id, MatchStatus::Processed).await?;

    Ok(MatchProcessingResult {
        match_id,
        season_id: entity.season_id,
        home_team_id: entity.home_team_id,
        away_team_id: entity.away_team_id,
        winner_team_id,
        home: TeamStandingUpdate {
            team_id: entity.home_team_id,
            delta: home_delta,
        },
        away: TeamStandingUpdate {
            team_id: entity.away_team_id,
            delta: away_delta,
        },
    })
}

/// Point scores summed across every set, home side first.
fn point_totals(sets: &[SetEntity]) -> (i64, i64) {
    sets.iter().fold((0, 0), |(home, away), set| {
        (home + set.home_score, away + set.away_score)
    })
}

/// Delta for one side given `(own, opponent)` set and point tallies.
fn side_delta(won: bool, sets: (i64, i64), points: (i64, i64)) -> StandingDelta {
    StandingDelta {
        wins: i64::from(won),
        losses: i64::from(!won),
        sets_won: sets.0,
        sets_lost: sets.1,
        points_won: points.0,
        points_lost: points.1,
        league_points: if won { WIN_POINTS } else { LOSS_POINTS },
    }
}
