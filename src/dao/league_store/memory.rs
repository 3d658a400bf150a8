//! In-process store used by tests and single-node deployments.
//!
//! A transaction holds the table lock for its whole lifetime and mutates a private copy of
//! the tables; commit swaps the copy in. Transactions are therefore serialized and a dropped
//! transaction leaves no trace.

use std::{collections::BTreeMap, sync::Arc};

use futures::future::{self, BoxFuture, FutureExt};
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::{LeagueStore, LeagueTransaction};
use crate::dao::{
    models::{
        ArchivedStandingEntity, MatchEntity, MatchId, MatchStatus, NewMatchEntity, SeasonEntity,
        SeasonId, SeasonTeamEntity, SetEntity, StandingDelta, StandingEntity, TeamEntity, TeamId,
    },
    storage::StorageResult,
};

#[derive(Clone, Default)]
pub struct MemoryLeagueStore {
    tables: Arc<Mutex<Tables>>,
}

#[derive(Debug, Clone, Default)]
struct Tables {
    seasons: BTreeMap<SeasonId, SeasonEntity>,
    teams: BTreeMap<TeamId, TeamEntity>,
    roster: BTreeMap<(SeasonId, TeamId), SeasonTeamEntity>,
    matches: BTreeMap<MatchId, MatchEntity>,
    matches_by_season: BTreeMap<SeasonId, Vec<MatchId>>,
    sets: BTreeMap<(MatchId, u32), SetEntity>,
    standings: BTreeMap<(SeasonId, TeamId), StandingEntity>,
    archived: BTreeMap<(SeasonId, u32, TeamId), ArchivedStandingEntity>,
    last_match_id: MatchId,
}

impl MemoryLeagueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a season row. Season metadata is managed outside this crate.
    pub async fn insert_season(&self, season: SeasonEntity) {
        let mut tables = self.tables.lock().await;
        tables.seasons.insert(season.id, season);
    }

    /// Seed a team row. Team metadata is managed outside this crate.
    pub async fn insert_team(&self, team: TeamEntity) {
        let mut tables = self.tables.lock().await;
        tables.teams.insert(team.id, team);
    }
}

impl LeagueStore for MemoryLeagueStore {
    fn begin(&self) -> BoxFuture<'static, StorageResult<Box<dyn LeagueTransaction>>> {
        let tables = self.tables.clone();
        async move {
            let guard = tables.lock_owned().await;
            let working = guard.clone();
            Ok(Box::new(MemoryTransaction { guard, working }) as Box<dyn LeagueTransaction>)
        }
        .boxed()
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        future::ready(Ok(())).boxed()
    }
}

struct MemoryTransaction {
    guard: OwnedMutexGuard<Tables>,
    working: Tables,
}

fn ready<'a, T: Send + 'a>(value: T) -> BoxFuture<'a, StorageResult<T>> {
    future::ready(Ok(value)).boxed()
}

impl Tables {
    fn roster_of(&self, season_id: SeasonId) -> impl Iterator<Item = &SeasonTeamEntity> {
        self.roster
            .range((season_id, TeamId::MIN)..=(season_id, TeamId::MAX))
            .map(|(_, member)| member)
    }

    fn standings_of(&self, season_id: SeasonId) -> impl Iterator<Item = &StandingEntity> {
        self.standings
            .range((season_id, TeamId::MIN)..=(season_id, TeamId::MAX))
            .map(|(_, standing)| standing)
    }

    fn match_ids_of(&self, season_id: SeasonId) -> &[MatchId] {
        self.matches_by_season
            .get(&season_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

impl LeagueTransaction for MemoryTransaction {
    fn find_season(&mut self, id: SeasonId) -> BoxFuture<'_, StorageResult<Option<SeasonEntity>>> {
        ready(self.working.seasons.get(&id).cloned())
    }

    fn mark_season_archived(&mut self, id: SeasonId) -> BoxFuture<'_, StorageResult<()>> {
        if let Some(season) = self.working.seasons.get_mut(&id) {
            season.archived = true;
        }
        ready(())
    }

    fn find_team(&mut self, id: TeamId) -> BoxFuture<'_, StorageResult<Option<TeamEntity>>> {
        ready(self.working.teams.get(&id).cloned())
    }

    fn season_roster(
        &mut self,
        season_id: SeasonId,
    ) -> BoxFuture<'_, StorageResult<Vec<SeasonTeamEntity>>> {
        let mut members: Vec<SeasonTeamEntity> =
            self.working.roster_of(season_id).cloned().collect();
        members.sort_by_key(|member| (member.joined_on, member.team_id));
        ready(members)
    }

    fn find_season_team(
        &mut self,
        season_id: SeasonId,
        team_id: TeamId,
    ) -> BoxFuture<'_, StorageResult<Option<SeasonTeamEntity>>> {
        ready(self.working.roster.get(&(season_id, team_id)).cloned())
    }

    fn insert_season_team(
        &mut self,
        member: SeasonTeamEntity,
    ) -> BoxFuture<'_, StorageResult<()>> {
        self.working
            .roster
            .insert((member.season_id, member.team_id), member);
        ready(())
    }

    fn count_season_matches(&mut self, season_id: SeasonId) -> BoxFuture<'_, StorageResult<u64>> {
        ready(self.working.match_ids_of(season_id).len() as u64)
    }

    fn insert_matches(
        &mut self,
        matches: Vec<NewMatchEntity>,
    ) -> BoxFuture<'_, StorageResult<Vec<MatchId>>> {
        let tables = &mut self.working;
        let ids = matches
            .into_iter()
            .map(|new_match| {
                tables.last_match_id += 1;
                let id = tables.last_match_id;
                tables
                    .matches_by_season
                    .entry(new_match.season_id)
                    .or_default()
                    .push(id);
                tables.matches.insert(id, new_match.into_entity(id));
                id
            })
            .collect();
        ready(ids)
    }

    fn find_match(&mut self, id: MatchId) -> BoxFuture<'_, StorageResult<Option<MatchEntity>>> {
        ready(self.working.matches.get(&id).cloned())
    }

    fn season_matches(
        &mut self,
        season_id: SeasonId,
        statuses: Vec<MatchStatus>,
    ) -> BoxFuture<'_, StorageResult<Vec<MatchEntity>>> {
        let mut matches: Vec<MatchEntity> = self
            .working
            .match_ids_of(season_id)
            .iter()
            .filter_map(|id| self.working.matches.get(id))
            .filter(|entity| statuses.contains(&entity.status))
            .cloned()
            .collect();
        matches.sort_by_key(|entity| (entity.scheduled_at, entity.id));
        ready(matches)
    }

    fn set_match_status(
        &mut self,
        id: MatchId,
        status: MatchStatus,
    ) -> BoxFuture<'_, StorageResult<()>> {
        if let Some(entity) = self.working.matches.get_mut(&id) {
            entity.status = status;
        }
        ready(())
    }

    fn save_match_outcome(&mut self, outcome: MatchEntity) -> BoxFuture<'_, StorageResult<()>> {
        if let Some(entity) = self.working.matches.get_mut(&outcome.id) {
            entity.winner_team_id = outcome.winner_team_id;
            entity.home_sets_won = outcome.home_sets_won;
            entity.away_sets_won = outcome.away_sets_won;
            entity.status = outcome.status;
        }
        ready(())
    }

    fn match_sets(&mut self, match_id: MatchId) -> BoxFuture<'_, StorageResult<Vec<SetEntity>>> {
        let sets = self
            .working
            .sets
            .range((match_id, u32::MIN)..=(match_id, u32::MAX))
            .map(|(_, set)| set.clone())
            .collect();
        ready(sets)
    }

    fn insert_sets(&mut self, sets: Vec<SetEntity>) -> BoxFuture<'_, StorageResult<()>> {
        for set in sets {
            self.working.sets.insert((set.match_id, set.set_number), set);
        }
        ready(())
    }

    fn insert_standing(&mut self, standing: StandingEntity) -> BoxFuture<'_, StorageResult<()>> {
        self.working
            .standings
            .insert((standing.season_id, standing.team_id), standing);
        ready(())
    }

    fn apply_standing_delta(
        &mut self,
        season_id: SeasonId,
        team_id: TeamId,
        delta: StandingDelta,
    ) -> BoxFuture<'_, StorageResult<StandingEntity>> {
        let standing = self
            .working
            .standings
            .entry((season_id, team_id))
            .or_insert_with(|| StandingEntity::zeroed(season_id, team_id));
        standing.apply(&delta);
        ready(standing.clone())
    }

    fn season_standings(
        &mut self,
        season_id: SeasonId,
    ) -> BoxFuture<'_, StorageResult<Vec<StandingEntity>>> {
        ready(self.working.standings_of(season_id).cloned().collect())
    }

    fn delete_season_standings(
        &mut self,
        season_id: SeasonId,
    ) -> BoxFuture<'_, StorageResult<u64>> {
        let keys: Vec<(SeasonId, TeamId)> = self
            .working
            .standings_of(season_id)
            .map(|standing| (standing.season_id, standing.team_id))
            .collect();
        for key in &keys {
            self.working.standings.remove(key);
        }
        ready(keys.len() as u64)
    }

    fn insert_archived_standings(
        &mut self,
        rows: Vec<ArchivedStandingEntity>,
    ) -> BoxFuture<'_, StorageResult<()>> {
        for row in rows {
            let key = (row.standing.season_id, row.rank, row.standing.team_id);
            self.working.archived.insert(key, row);
        }
        ready(())
    }

    fn archived_standings(
        &mut self,
        season_id: SeasonId,
    ) -> BoxFuture<'_, StorageResult<Vec<ArchivedStandingEntity>>> {
        let rows = self
            .working
            .archived
            .range((season_id, u32::MIN, TeamId::MIN)..=(season_id, u32::MAX, TeamId::MAX))
            .map(|(_, row)| row.clone())
            .collect();
        ready(rows)
    }

    fn commit(self: Box<Self>) -> BoxFuture<'static, StorageResult<()>> {
        let MemoryTransaction { mut guard, working } = *self;
        *guard = working;
        ready(())
    }
}

#[cfg(test)]
mod tests {
    use time::macros::{date, datetime};

    use super::*;

    fn season(id: SeasonId) -> SeasonEntity {
        SeasonEntity {
            id,
            league_id: 1,
            name: format!("Season {id}"),
            start_date: date!(2025 - 09 - 01),
            end_date: date!(2026 - 05 - 31),
            archived: false,
        }
    }

    fn fixture(season_id: SeasonId, home: TeamId, away: TeamId) -> NewMatchEntity {
        NewMatchEntity {
            season_id,
            home_team_id: home,
            away_team_id: away,
            scheduled_at: datetime!(2025-09-01 0:00 UTC),
            venue: None,
            status: MatchStatus::Scheduled,
        }
    }

    #[tokio::test]
    async fn dropped_transaction_leaves_no_trace() {
        let store = MemoryLeagueStore::new();
        store.insert_season(season(1)).await;

        {
            let mut tx = store.begin().await.unwrap();
            tx.insert_matches(vec![fixture(1, 1, 2)]).await.unwrap();
            tx.mark_season_archived(1).await.unwrap();
        }

        let mut tx = store.begin().await.unwrap();
        assert_eq!(tx.count_season_matches(1).await.unwrap(), 0);
        assert!(!tx.find_season(1).await.unwrap().unwrap().archived);
    }

    #[tokio::test]
    async fn committed_writes_are_visible_to_later_transactions() {
        let store = MemoryLeagueStore::new();
        store.insert_season(season(1)).await;

        let mut tx = store.begin().await.unwrap();
        let ids = tx
            .insert_matches(vec![fixture(1, 1, 2), fixture(1, 3, 4)])
            .await
            .unwrap();
        tx.commit().await.unwrap();
        assert_eq!(ids, vec![1, 2]);

        let mut tx = store.begin().await.unwrap();
        assert_eq!(tx.count_season_matches(1).await.unwrap(), 2);
        assert_eq!(tx.count_season_matches(2).await.unwrap(), 0);
        let found = tx.find_match(2).await.unwrap().unwrap();
        assert_eq!((found.home_team_id, found.away_team_id), (3, 4));
    }

    #[tokio::test]
    async fn standing_delta_upserts_and_counts_matches() {
        let store = MemoryLeagueStore::new();
        let mut tx = store.begin().await.unwrap();
        let delta = StandingDelta {
            wins: 1,
            sets_won: 3,
            sets_lost: 1,
            points_won: 98,
            points_lost: 80,
            league_points: 3,
            ..StandingDelta::default()
        };

        tx.apply_standing_delta(7, 42, delta).await.unwrap();
        let after = tx.apply_standing_delta(7, 42, delta).await.unwrap();

        assert_eq!(after.matches_played, 2);
        assert_eq!(after.wins, 2);
        assert_eq!(after.sets_won, 6);
        assert_eq!(after.league_points, 6);
        assert_eq!(tx.season_standings(7).await.unwrap().len(), 1);
        assert!(tx.season_standings(8).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn deleting_standings_only_touches_one_season() {
        let store = MemoryLeagueStore::new();
        let mut tx = store.begin().await.unwrap();
        for (season_id, team_id) in [(6, 1), (7, 1), (7, 2), (7, 3), (8, 2)] {
            tx.insert_standing(StandingEntity::zeroed(season_id, team_id))
                .await
                .unwrap();
        }

        assert_eq!(tx.delete_season_standings(7).await.unwrap(), 3);
        assert!(tx.season_standings(7).await.unwrap().is_empty());
        assert_eq!(tx.season_standings(6).await.unwrap().len(), 1);
        assert_eq!(tx.season_standings(8).await.unwrap().len(), 1);
        assert_eq!(tx.delete_season_standings(7).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn roster_is_ordered_by_join_date_then_team() {
        let store = MemoryLeagueStore::new();
        let mut tx = store.begin().await.unwrap();
        for (team_id, joined_on) in [
            (9, date!(2025 - 08 - 01)),
            (3, date!(2025 - 08 - 02)),
            (5, date!(2025 - 08 - 01)),
        ] {
            tx.insert_season_team(SeasonTeamEntity {
                season_id: 1,
                team_id,
                joined_on,
            })
            .await
            .unwrap();
        }

        let order: Vec<TeamId> = tx
            .season_roster(1)
            .await
            .unwrap()
            .into_iter()
            .map(|member| member.team_id)
            .collect();
        assert_eq!(order, vec![5, 9, 3]);
    }
}
