use tracing::{debug, info};

use crate::{
    dao::models::{MatchStatus, SeasonId, StandingEntity},
    dto::standings::RecalculationSummary,
    error::ServiceError,
    services::{lifecycle::require_active_season, match_processor},
    state::SharedState,
};

/// Rebuild a season's standings from its match and set history.
///
/// Live records are wiped and re-seeded zeroed for every roster member, then every
/// FINISHED or PROCESSED match is replayed in kick-off order. Runs as one transaction.
pub async fn recalculate_standings(
    state: &SharedState,
    season_id: SeasonId,
) -> Result<RecalculationSummary, ServiceError> {
    let mut tx = state.begin().await?;
    require_active_season(tx.as_mut(), season_id, "recalculate standings").await?;

    let cleared = tx.delete_season_standings(season_id).await?;
    let roster = tx.season_roster(season_id).await?;
    for member in roster {
        tx.insert_standing(StandingEntity::zeroed(season_id, member.team_id))
            .await?;
    }

    let matches = tx
        .season_matches(season_id, vec![MatchStatus::Finished, MatchStatus::Processed])
        .await?;
    for entity in &matches {
        tx.set_match_status(entity.id, MatchStatus::Finished).await?;
        match_processor::process_in(tx.as_mut(), entity.id).await?;
        debug!(season_id, match_id = entity.id, "match replayed");
    }
    tx.commit().await?;

    info!(
        season_id,
        cleared,
        matches_processed = matches.len(),
        "standings recalculated"
    );
    Ok(RecalculationSummary {
        season_id,
        matches_processed: matches.len(),
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use time::macros::{date, datetime};

    use super::*;
    use crate::{
        config::AppConfig,
        dao::{
            league_store::{LeagueStore, memory::MemoryLeagueStore},
            models::{NewMatchEntity, SeasonEntity, SeasonTeamEntity, SetEntity, StandingDelta},
        },
        state::AppState,
    };

    /// Season 1 with teams 1..=3 and two finished matches: 1 beats 2, 3 beats 1.
    async fn season_with_results() -> (MemoryLeagueStore, SharedState) {
        let store = MemoryLeagueStore::new();
        store
            .insert_season(SeasonEntity {
                id: 1,
                league_id: 1,
                name: "Spring".into(),
                start_date: date!(2026 - 03 - 01),
                end_date: date!(2026 - 06 - 30),
                archived: false,
            })
            .await;

        let mut tx = store.begin().await.unwrap();
        for team_id in 1..=3 {
            tx.insert_season_team(SeasonTeamEntity {
                season_id: 1,
                team_id,
                joined_on: date!(2026 - 02 - 01),
            })
            .await
            .unwrap();
            tx.insert_standing(StandingEntity::zeroed(1, team_id))
                .await
                .unwrap();
        }
        let results = [
            (1, 2, datetime!(2026-03-02 0:00 UTC), [(25, 21), (25, 23)]),
            (3, 1, datetime!(2026-03-09 0:00 UTC), [(25, 15), (25, 17)]),
        ];
        for (home, away, scheduled_at, sets) in results {
            let ids = tx
                .insert_matches(vec![NewMatchEntity {
                    season_id: 1,
                    home_team_id: home,
                    away_team_id: away,
                    scheduled_at,
                    venue: None,
                    status: MatchStatus::Scheduled,
                }])
                .await
                .unwrap();
            let mut entity = tx.find_match(ids[0]).await.unwrap().unwrap();
            entity.status = MatchStatus::Finished;
            entity.winner_team_id = Some(home);
            entity.home_sets_won = 2;
            tx.save_match_outcome(entity).await.unwrap();
            tx.insert_sets(
                sets.iter()
                    .zip(1..)
                    .map(|(&(home_score, away_score), set_number)| SetEntity {
                        match_id: ids[0],
                        set_number,
                        home_score,
                        away_score,
                    })
                    .collect(),
            )
            .await
            .unwrap();
        }
        tx.commit().await.unwrap();

        let state = AppState::new(Arc::new(store.clone()), AppConfig::default());
        (store, state)
    }

    async fn standings(store: &MemoryLeagueStore) -> Vec<StandingEntity> {
        let mut tx = store.begin().await.unwrap();
        tx.season_standings(1).await.unwrap()
    }

    #[tokio::test]
    async fn replays_finished_matches_and_is_repeatable() {
        let (store, state) = season_with_results().await;

        let first = recalculate_standings(&state, 1).await.unwrap();
        assert_eq!(first.matches_processed, 2);
        let after_first = standings(&store).await;

        let second = recalculate_standings(&state, 1).await.unwrap();
        assert_eq!(second.matches_processed, 2);
        assert_eq!(standings(&store).await, after_first);

        let team_one = after_first.iter().find(|s| s.team_id == 1).unwrap();
        assert_eq!(team_one.matches_played, 2);
        assert_eq!(team_one.wins, 1);
        assert_eq!(team_one.sets_won, 2);
        assert_eq!(team_one.sets_lost, 2);
        assert_eq!(team_one.points_won, 50 + 32);
        assert_eq!(team_one.points_lost, 44 + 50);
        assert_eq!(team_one.league_points, 3);
    }

    #[tokio::test]
    async fn drifted_ledger_is_repaired() {
        let (store, state) = season_with_results().await;
        recalculate_standings(&state, 1).await.unwrap();
        let expected = standings(&store).await;

        let mut tx = store.begin().await.unwrap();
        tx.apply_standing_delta(
            1,
            2,
            StandingDelta {
                wins: 5,
                league_points: 15,
                ..StandingDelta::default()
            },
        )
        .await
        .unwrap();
        tx.commit().await.unwrap();
        assert_ne!(standings(&store).await, expected);

        recalculate_standings(&state, 1).await.unwrap();
        assert_eq!(standings(&store).await, expected);
    }

    #[tokio::test]
    async fn roster_members_without_results_keep_a_zeroed_record() {
        let (store, state) = season_with_results().await;
        let mut tx = store.begin().await.unwrap();
        tx.insert_season_team(SeasonTeamEntity {
            season_id: 1,
            team_id: 4,
            joined_on: date!(2026 - 03 - 05),
        })
        .await
        .unwrap();
        tx.commit().await.unwrap();

        recalculate_standings(&state, 1).await.unwrap();
        let rows = standings(&store).await;
        assert_eq!(rows.len(), 4);
        assert_eq!(
            rows.iter().find(|s| s.team_id == 4),
            Some(&StandingEntity::zeroed(1, 4))
        );
    }
}
