use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::dao::models::{SeasonId, StandingEntity, TeamId};

/// One row of a ranked standings table.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RankedStanding {
    /// 1-based position.
    pub rank: u32,
    pub team_id: TeamId,
    pub matches_played: i64,
    pub wins: i64,
    pub losses: i64,
    pub sets_won: i64,
    pub sets_lost: i64,
    pub set_diff: i64,
    pub points_won: i64,
    pub points_lost: i64,
    pub point_diff: i64,
    pub league_points: i64,
}

impl RankedStanding {
    pub fn new(rank: u32, standing: &StandingEntity) -> Self {
        Self {
            rank,
            team_id: standing.team_id,
            matches_played: standing.matches_played,
            wins: standing.wins,
            losses: standing.losses,
            sets_won: standing.sets_won,
            sets_lost: standing.sets_lost,
            set_diff: standing.set_diff(),
            points_won: standing.points_won,
            points_lost: standing.points_lost,
            point_diff: standing.point_diff(),
            league_points: standing.league_points,
        }
    }
}

/// Frozen table written when a season was archived.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ArchivedStandings {
    pub season_id: SeasonId,
    pub archive_id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub archived_at: OffsetDateTime,
    pub standings: Vec<RankedStanding>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RecalculationSummary {
    pub season_id: SeasonId,
    /// Matches replayed into the rebuilt ledger.
    pub matches_processed: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ArchiveSummary {
    pub season_id: SeasonId,
    pub archive_id: Uuid,
    pub teams_archived: usize,
    #[serde(with = "time::serde::rfc3339")]
    pub archived_at: OffsetDateTime,
}
