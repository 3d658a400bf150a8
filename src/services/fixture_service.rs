use time::Time;
use tracing::{info, warn};
use validator::Validate;

use crate::{
    config::SchedulingDefaults,
    dao::models::{MatchStatus, NewMatchEntity, SeasonId, TeamId},
    dto::fixtures::{FixtureView, FixturesSummary, GenerateFixturesRequest},
    error::ServiceError,
    services::{
        lifecycle::{require_active_season, require_season},
        pairing::{round_robin, shuffle_pairings},
        period_scheduler::{PeriodRules, schedule},
        weekday::WeekdayMask,
    },
    state::SharedState,
};

/// Build the season's fixture list and persist it in one transaction.
///
/// The zero-existing-matches check runs in the same transaction as the insert, so two
/// concurrent generations for one season cannot both succeed.
pub async fn generate_fixtures(
    state: &SharedState,
    request: GenerateFixturesRequest,
) -> Result<FixturesSummary, ServiceError> {
    request.validate()?;
    let rules = resolve_rules(state.config().scheduling(), &request)?;
    let season_id = request.season_id;

    let mut tx = state.begin().await?;
    require_active_season(tx.as_mut(), season_id, "generate fixtures").await?;

    let existing = tx.count_season_matches(season_id).await?;
    if existing > 0 {
        warn!(season_id, existing, "fixtures already generated");
        return Err(ServiceError::Conflict(format!(
            "season `{season_id}` already has {existing} matches"
        )));
    }

    let roster = tx.season_roster(season_id).await?;
    if roster.len() < 2 {
        return Err(ServiceError::InvalidState(format!(
            "season `{season_id}` needs at least two teams, has {}",
            roster.len()
        )));
    }
    let team_ids: Vec<TeamId> = roster.iter().map(|member| member.team_id).collect();

    let mut pairings = round_robin(&team_ids, request.double_round_robin)?;
    if request.shuffle {
        shuffle_pairings(&mut pairings, &mut rand::rng());
    }
    let fixtures = schedule(&pairings, request.start_date, &rules)?;

    let (Some(first), Some(last)) = (fixtures.first(), fixtures.last()) else {
        return Err(ServiceError::InvalidState(format!(
            "season `{season_id}` produced no fixtures"
        )));
    };
    let (first_date, last_date) = (first.date, last.date);

    let matches: Vec<NewMatchEntity> = fixtures
        .iter()
        .map(|fixture| NewMatchEntity {
            season_id,
            home_team_id: fixture.home,
            away_team_id: fixture.away,
            scheduled_at: fixture.date.with_time(Time::MIDNIGHT).assume_utc(),
            venue: None,
            status: fixture.status,
        })
        .collect();
    let ids = tx.insert_matches(matches).await?;
    tx.commit().await?;

    info!(
        season_id,
        teams = team_ids.len(),
        matches_created = ids.len(),
        %first_date,
        %last_date,
        "fixtures generated"
    );

    Ok(FixturesSummary {
        season_id,
        matches_created: ids.len(),
        first_date,
        last_date,
    })
}

/// Every match of a season in calendar order.
pub async fn season_fixtures(
    state: &SharedState,
    season_id: SeasonId,
) -> Result<Vec<FixtureView>, ServiceError> {
    let mut tx = state.begin().await?;
    require_season(tx.as_mut(), season_id).await?;
    let matches = tx
        .season_matches(
            season_id,
            vec![
                MatchStatus::Scheduled,
                MatchStatus::Finished,
                MatchStatus::Processed,
            ],
        )
        .await?;
    Ok(matches.into_iter().map(FixtureView::from).collect())
}

/// Merge request overrides with the configured defaults.
fn resolve_rules(
    defaults: &SchedulingDefaults,
    request: &GenerateFixturesRequest,
) -> Result<PeriodRules, ServiceError> {
    let allowed_weekdays = match request.allowed_weekdays.as_deref() {
        Some(flags) => WeekdayMask::try_from(flags)?,
        None => defaults.allowed_weekdays,
    };
    Ok(PeriodRules {
        matches_per_period: request
            .matches_per_period
            .unwrap_or(defaults.matches_per_period),
        period_weeks: request.period_weeks.unwrap_or(defaults.period_weeks),
        allowed_weekdays,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use time::{Date, macros::date};

    use super::*;
    use crate::{
        config::AppConfig,
        dao::{
            league_store::{LeagueStore, memory::MemoryLeagueStore},
            models::{SeasonEntity, SeasonTeamEntity, TeamEntity},
        },
        state::AppState,
    };

    async fn seeded(teams: &[TeamId], archived: bool) -> (MemoryLeagueStore, SharedState) {
        let store = MemoryLeagueStore::new();
        store
            .insert_season(SeasonEntity {
                id: 1,
                league_id: 1,
                name: "Autumn".into(),
                start_date: date!(2025 - 09 - 01),
                end_date: date!(2025 - 12 - 20),
                archived,
            })
            .await;
        let mut tx = store.begin().await.unwrap();
        for &team_id in teams {
            tx.insert_season_team(SeasonTeamEntity {
                season_id: 1,
                team_id,
                joined_on: date!(2025 - 08 - 01),
            })
            .await
            .unwrap();
        }
        tx.commit().await.unwrap();
        for &team_id in teams {
            store
                .insert_team(TeamEntity {
                    id: team_id,
                    name: format!("Team {team_id}"),
                })
                .await;
        }
        let state = AppState::new(Arc::new(store.clone()), AppConfig::default());
        (store, state)
    }

    #[tokio::test]
    async fn four_teams_fill_three_weeks() {
        let (_store, state) = seeded(&[1, 2, 3, 4], false).await;

        let summary = generate_fixtures(&state, GenerateFixturesRequest::new(1, date!(2025 - 09 - 01)))
            .await
            .unwrap();
        assert_eq!(summary.matches_created, 6);
        assert_eq!(summary.first_date, date!(2025 - 09 - 01));
        assert_eq!(summary.last_date, date!(2025 - 09 - 15));

        let fixtures = season_fixtures(&state, 1).await.unwrap();
        let days: Vec<Date> = fixtures.iter().map(|f| f.scheduled_at.date()).collect();
        assert_eq!(
            days,
            vec![
                date!(2025 - 09 - 01),
                date!(2025 - 09 - 01),
                date!(2025 - 09 - 08),
                date!(2025 - 09 - 08),
                date!(2025 - 09 - 15),
                date!(2025 - 09 - 15),
            ]
        );
        assert!(fixtures.iter().all(|f| f.status == MatchStatus::Scheduled));
    }

    #[tokio::test]
    async fn second_generation_conflicts() {
        let (_store, state) = seeded(&[1, 2, 3], false).await;
        let mut request = GenerateFixturesRequest::new(1, date!(2025 - 09 - 01));
        request.double_round_robin = true;
        request.shuffle = true;

        let summary = generate_fixtures(&state, request.clone()).await.unwrap();
        assert_eq!(summary.matches_created, 6);

        let err = generate_fixtures(&state, request).await.unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
        assert_eq!(season_fixtures(&state, 1).await.unwrap().len(), 6);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn concurrent_generations_leave_one_fixture_set() {
        let (_store, state) = seeded(&[1, 2, 3, 4], false).await;
        let request = GenerateFixturesRequest::new(1, date!(2025 - 09 - 01));

        let first = tokio::spawn({
            let (state, request) = (state.clone(), request.clone());
            async move { generate_fixtures(&state, request).await }
        });
        let second = tokio::spawn({
            let state = state.clone();
            async move { generate_fixtures(&state, request).await }
        });
        let outcomes = [first.await.unwrap(), second.await.unwrap()];

        let created: Vec<usize> = outcomes
            .iter()
            .filter_map(|outcome| outcome.as_ref().ok().map(|summary| summary.matches_created))
            .collect();
        assert_eq!(created, vec![6]);
        assert!(
            outcomes
                .iter()
                .any(|outcome| matches!(outcome, Err(ServiceError::Conflict(_))))
        );
        assert_eq!(season_fixtures(&state, 1).await.unwrap().len(), 6);
    }

    #[tokio::test]
    async fn lifecycle_and_configuration_errors() {
        let (_store, archived) = seeded(&[1, 2], true).await;
        let err = generate_fixtures(&archived, GenerateFixturesRequest::new(1, date!(2025 - 09 - 01)))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));

        let (_store, lonely) = seeded(&[1], false).await;
        let err = generate_fixtures(&lonely, GenerateFixturesRequest::new(1, date!(2025 - 09 - 01)))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));

        let err = generate_fixtures(&lonely, GenerateFixturesRequest::new(7, date!(2025 - 09 - 01)))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));

        let mut request = GenerateFixturesRequest::new(1, date!(2025 - 09 - 01));
        request.allowed_weekdays = Some(vec![true; 3]);
        let err = generate_fixtures(&lonely, request).await.unwrap_err();
        assert!(matches!(err, ServiceError::Configuration(_)));
    }
}
