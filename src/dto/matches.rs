use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError, ValidationErrors};

use crate::{
    dao::models::{MatchId, SeasonId, StandingDelta, TeamId},
    dto::validation::validate_set_score,
};

/// Standings change applied to one side of a processed match.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct TeamStandingUpdate {
    pub team_id: TeamId,
    #[serde(flatten)]
    pub delta: StandingDelta,
}

/// Transient report of a match folded into the standings. Not persisted.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct MatchProcessingResult {
    pub match_id: MatchId,
    pub season_id: SeasonId,
    pub home_team_id: TeamId,
    pub away_team_id: TeamId,
    pub winner_team_id: TeamId,
    pub home: TeamStandingUpdate,
    pub away: TeamStandingUpdate,
}

/// Point score of one set, home side first.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
pub struct SetScore {
    pub home: u32,
    pub away: u32,
}

/// Set-by-set result of a played match, in playing order.
#[derive(Debug, Clone, Deserialize)]
pub struct RecordResultRequest {
    pub match_id: MatchId,
    pub sets: Vec<SetScore>,
}

impl RecordResultRequest {
    /// Sets won by the home and away side.
    pub fn set_tally(&self) -> (i64, i64) {
        self.sets.iter().fold((0, 0), |(home, away), set| {
            if set.home > set.away {
                (home + 1, away)
            } else {
                (home, away + 1)
            }
        })
    }
}

impl Validate for RecordResultRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if self.sets.is_empty() {
            let mut err = ValidationError::new("length");
            err.message = Some("a result needs at least one set".into());
            errors.add("sets", err);
        }

        for set in &self.sets {
            if let Err(e) = validate_set_score(set.home, set.away) {
                errors.add("sets", e);
            }
        }

        let (home, away) = self.set_tally();
        if !self.sets.is_empty() && home == away {
            let mut err = ValidationError::new("undecided");
            err.message = Some(format!("sets are split {home}-{away}; no winner").into());
            errors.add("sets", err);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Outcome of recording a result.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RecordedResult {
    pub match_id: MatchId,
    pub winner_team_id: TeamId,
    pub home_sets_won: i64,
    pub away_sets_won: i64,
}
