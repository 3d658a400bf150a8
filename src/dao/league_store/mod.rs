pub mod memory;
#[cfg(feature = "mongo-store")]
pub mod mongodb;

use futures::future::BoxFuture;

use crate::dao::models::{
    ArchivedStandingEntity, MatchEntity, MatchId, MatchStatus, NewMatchEntity, SeasonEntity,
    SeasonId, SeasonTeamEntity, SetEntity, StandingDelta, StandingEntity, TeamEntity, TeamId,
};
use crate::dao::storage::StorageResult;

/// Abstraction over the persistence layer holding seasons, fixtures, and standings.
pub trait LeagueStore: Send + Sync {
    /// Open a transaction. Every write made through it becomes visible only on commit.
    fn begin(&self) -> BoxFuture<'static, StorageResult<Box<dyn LeagueTransaction>>>;
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
}

/// Unit of work against the store.
///
/// Dropping a transaction without calling [`LeagueTransaction::commit`] rolls back every
/// write made through it.
pub trait LeagueTransaction: Send {
    fn find_season(&mut self, id: SeasonId) -> BoxFuture<'_, StorageResult<Option<SeasonEntity>>>;
    fn mark_season_archived(&mut self, id: SeasonId) -> BoxFuture<'_, StorageResult<()>>;
    fn find_team(&mut self, id: TeamId) -> BoxFuture<'_, StorageResult<Option<TeamEntity>>>;

    /// Season members ordered by join date, then team id.
    fn season_roster(
        &mut self,
        season_id: SeasonId,
    ) -> BoxFuture<'_, StorageResult<Vec<SeasonTeamEntity>>>;
    fn find_season_team(
        &mut self,
        season_id: SeasonId,
        team_id: TeamId,
    ) -> BoxFuture<'_, StorageResult<Option<SeasonTeamEntity>>>;
    fn insert_season_team(&mut self, member: SeasonTeamEntity)
    -> BoxFuture<'_, StorageResult<()>>;

    fn count_season_matches(&mut self, season_id: SeasonId) -> BoxFuture<'_, StorageResult<u64>>;
    /// Insert fixtures, returning the assigned ids in input order.
    fn insert_matches(
        &mut self,
        matches: Vec<NewMatchEntity>,
    ) -> BoxFuture<'_, StorageResult<Vec<MatchId>>>;
    fn find_match(&mut self, id: MatchId) -> BoxFuture<'_, StorageResult<Option<MatchEntity>>>;
    /// Matches of a season whose status is in `statuses`, ordered by kick-off then id.
    fn season_matches(
        &mut self,
        season_id: SeasonId,
        statuses: Vec<MatchStatus>,
    ) -> BoxFuture<'_, StorageResult<Vec<MatchEntity>>>;
    fn set_match_status(
        &mut self,
        id: MatchId,
        status: MatchStatus,
    ) -> BoxFuture<'_, StorageResult<()>>;
    /// Overwrite the outcome columns (winner, sets won, status) of an existing match.
    fn save_match_outcome(&mut self, outcome: MatchEntity) -> BoxFuture<'_, StorageResult<()>>;

    /// Sets of a match ordered by set number.
    fn match_sets(&mut self, match_id: MatchId) -> BoxFuture<'_, StorageResult<Vec<SetEntity>>>;
    fn insert_sets(&mut self, sets: Vec<SetEntity>) -> BoxFuture<'_, StorageResult<()>>;

    fn insert_standing(&mut self, standing: StandingEntity) -> BoxFuture<'_, StorageResult<()>>;
    /// Upsert the (season, team) record: create it zeroed when absent, then fold `delta` in.
    fn apply_standing_delta(
        &mut self,
        season_id: SeasonId,
        team_id: TeamId,
        delta: StandingDelta,
    ) -> BoxFuture<'_, StorageResult<StandingEntity>>;
    fn season_standings(
        &mut self,
        season_id: SeasonId,
    ) -> BoxFuture<'_, StorageResult<Vec<StandingEntity>>>;
    /// Remove every live record of a season, returning how many were deleted.
    fn delete_season_standings(&mut self, season_id: SeasonId)
    -> BoxFuture<'_, StorageResult<u64>>;

    fn insert_archived_standings(
        &mut self,
        rows: Vec<ArchivedStandingEntity>,
    ) -> BoxFuture<'_, StorageResult<()>>;
    /// Archived rows of a season ordered by rank.
    fn archived_standings(
        &mut self,
        season_id: SeasonId,
    ) -> BoxFuture<'_, StorageResult<Vec<ArchivedStandingEntity>>>;

    fn commit(self: Box<Self>) -> BoxFuture<'static, StorageResult<()>>;
}
