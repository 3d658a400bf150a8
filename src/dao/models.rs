use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

/// Identifier of a season row.
pub type SeasonId = i64;
/// Identifier of a team row.
pub type TeamId = i64;
/// Identifier of a match row.
pub type MatchId = i64;

/// Bounded competition cycle within a league.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SeasonEntity {
    /// Primary key of the season.
    pub id: SeasonId,
    /// League the season belongs to.
    pub league_id: i64,
    /// Display name of the season.
    pub name: String,
    /// First day of the season.
    pub start_date: Date,
    /// Last day of the season.
    pub end_date: Date,
    /// Once set, fixtures and standings of the season are frozen.
    pub archived: bool,
}

/// Team that can take part in seasons.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TeamEntity {
    /// Primary key of the team.
    pub id: TeamId,
    /// Display name chosen for the team.
    pub name: String,
}

/// Membership of a team in a season; defines the scheduling participants.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SeasonTeamEntity {
    pub season_id: SeasonId,
    pub team_id: TeamId,
    /// Day the team joined the roster.
    pub joined_on: Date,
}

/// Lifecycle of a match. Only ever moves forward.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchStatus {
    /// Created by fixture generation, not played yet.
    Scheduled,
    /// Result recorded, standings not yet updated.
    Finished,
    /// Result folded into the standings ledger.
    Processed,
}

impl MatchStatus {
    /// Storage representation, shared by every backend.
    pub fn as_str(self) -> &'static str {
        match self {
            MatchStatus::Scheduled => "SCHEDULED",
            MatchStatus::Finished => "FINISHED",
            MatchStatus::Processed => "PROCESSED",
        }
    }
}

/// Persisted match between two season members.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MatchEntity {
    pub id: MatchId,
    pub season_id: SeasonId,
    pub home_team_id: TeamId,
    pub away_team_id: TeamId,
    pub scheduled_at: OffsetDateTime,
    pub venue: Option<String>,
    pub status: MatchStatus,
    pub winner_team_id: Option<TeamId>,
    pub home_sets_won: i64,
    pub away_sets_won: i64,
}

/// Match payload before the store assigns it an identifier.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewMatchEntity {
    pub season_id: SeasonId,
    pub home_team_id: TeamId,
    pub away_team_id: TeamId,
    pub scheduled_at: OffsetDateTime,
    pub venue: Option<String>,
    pub status: MatchStatus,
}

impl NewMatchEntity {
    /// Materialise the row once the store has chosen its id.
    pub fn into_entity(self, id: MatchId) -> MatchEntity {
        MatchEntity {
            id,
            season_id: self.season_id,
            home_team_id: self.home_team_id,
            away_team_id: self.away_team_id,
            scheduled_at: self.scheduled_at,
            venue: self.venue,
            status: self.status,
            winner_team_id: None,
            home_sets_won: 0,
            away_sets_won: 0,
        }
    }
}

/// Point scores of one set of a match.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SetEntity {
    pub match_id: MatchId,
    /// 1-based position of the set inside the match.
    pub set_number: u32,
    pub home_score: i64,
    pub away_score: i64,
}

/// Aggregate record of a team inside a live season.
///
/// Set and point differences are derived on read and never stored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StandingEntity {
    pub season_id: SeasonId,
    pub team_id: TeamId,
    pub matches_played: i64,
    pub wins: i64,
    pub losses: i64,
    pub sets_won: i64,
    pub sets_lost: i64,
    pub points_won: i64,
    pub points_lost: i64,
    pub league_points: i64,
}

impl StandingEntity {
    /// Fresh record for a team that has not played yet.
    pub fn zeroed(season_id: SeasonId, team_id: TeamId) -> Self {
        Self {
            season_id,
            team_id,
            matches_played: 0,
            wins: 0,
            losses: 0,
            sets_won: 0,
            sets_lost: 0,
            points_won: 0,
            points_lost: 0,
            league_points: 0,
        }
    }

    /// Fold one processed match into the record.
    pub fn apply(&mut self, delta: &StandingDelta) {
        self.matches_played += 1;
        self.wins += delta.wins;
        self.losses += delta.losses;
        self.sets_won += delta.sets_won;
        self.sets_lost += delta.sets_lost;
        self.points_won += delta.points_won;
        self.points_lost += delta.points_lost;
        self.league_points += delta.league_points;
    }

    pub fn set_diff(&self) -> i64 {
        self.sets_won - self.sets_lost
    }

    pub fn point_diff(&self) -> i64 {
        self.points_won - self.points_lost
    }
}

/// Increment applied to one standing record for a single processed match.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct StandingDelta {
    pub wins: i64,
    pub losses: i64,
    pub sets_won: i64,
    pub sets_lost: i64,
    pub points_won: i64,
    pub points_lost: i64,
    pub league_points: i64,
}

/// Immutable snapshot of a standing taken when its season was archived.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ArchivedStandingEntity {
    /// Groups every snapshot row written by the same archival.
    pub archive_id: Uuid,
    /// Final 1-based position in the season.
    pub rank: u32,
    pub archived_at: OffsetDateTime,
    pub standing: StandingEntity,
}
