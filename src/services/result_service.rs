use tracing::{info, warn};
use validator::Validate;

use crate::{
    dao::models::{MatchEntity, MatchStatus, SetEntity},
    dto::matches::{RecordResultRequest, RecordedResult},
    error::ServiceError,
    services::lifecycle::require_active_season,
    state::SharedState,
};

/// Store the set scores of a played match and move it to FINISHED.
///
/// The winner and set counters are derived from the sets, so a later processing run can
/// rely on them.
pub async fn record_match_result(
    state: &SharedState,
    request: RecordResultRequest,
) -> Result<RecordedResult, ServiceError> {
    request.validate()?;
    let match_id = request.match_id;

    let mut tx = state.begin().await?;
    let Some(entity) = tx.find_match(match_id).await? else {
        return Err(ServiceError::NotFound(format!(
            "match `{match_id}` not found"
        )));
    };
    require_active_season(tx.as_mut(), entity.season_id, "record results").await?;
    if entity.status != MatchStatus::Scheduled {
        warn!(match_id, status = entity.status.as_str(), "result already recorded");
        return Err(ServiceError::InvalidState(format!(
            "match `{match_id}` is {}, expected SCHEDULED",
            entity.status.as_str()
        )));
    }

    let (home_sets_won, away_sets_won) = request.set_tally();
    let winner_team_id = if home_sets_won > away_sets_won {
        entity.home_team_id
    } else {
        entity.away_team_id
    };

    let sets: Vec<SetEntity> = request
        .sets
        .iter()
        .zip(1..)
        .map(|(score, set_number)| SetEntity {
            match_id,
            set_number,
            home_score: i64::from(score.home),
            away_score: i64::from(score.away),
        })
        .collect();
    tx.insert_sets(sets).await?;
    tx.save_match_outcome(MatchEntity {
        status: MatchStatus::Finished,
        winner_team_id: Some(winner_team_id),
        home_sets_won,
        away_sets_won,
        ..entity
    })
    .await?;
    tx.commit().await?;

    info!(match_id, winner_team_id, home_sets_won, away_sets_won, "result recorded");
    Ok(RecordedResult {
        match_id,
        winner_team_id,
        home_sets_won,
        away_sets_won,
    })
}
