use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};
use validator::{Validate, ValidationError, ValidationErrors};

use crate::{
    dao::models::{MatchEntity, MatchId, MatchStatus, SeasonId, TeamId},
    dto::validation::validate_weekdays,
};

/// Request to build and persist the full fixture list of a season.
///
/// Unset scheduling fields fall back to the configured defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerateFixturesRequest {
    pub season_id: SeasonId,
    /// Date of the first period; snapped forward to an allowed weekday.
    pub start_date: Date,
    #[serde(default)]
    pub matches_per_period: Option<u32>,
    #[serde(default)]
    pub period_weeks: Option<u32>,
    /// Schedule every pairing twice, once per venue.
    #[serde(default)]
    pub double_round_robin: bool,
    /// Seven flags, Monday first.
    #[serde(default)]
    pub allowed_weekdays: Option<Vec<bool>>,
    /// Randomly permute pairings before they are placed on the calendar.
    #[serde(default)]
    pub shuffle: bool,
}

impl GenerateFixturesRequest {
    /// Request with every optional field left to the defaults.
    pub fn new(season_id: SeasonId, start_date: Date) -> Self {
        Self {
            season_id,
            start_date,
            matches_per_period: None,
            period_weeks: None,
            double_round_robin: false,
            allowed_weekdays: None,
            shuffle: false,
        }
    }
}

impl Validate for GenerateFixturesRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if self.period_weeks == Some(0) {
            let mut err = ValidationError::new("range");
            err.message = Some("period_weeks must be at least 1".into());
            errors.add("period_weeks", err);
        }

        if let Some(ref flags) = self.allowed_weekdays {
            if let Err(e) = validate_weekdays(flags) {
                errors.add("allowed_weekdays", e);
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Outcome of a fixture generation run.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FixturesSummary {
    pub season_id: SeasonId,
    pub matches_created: usize,
    pub first_date: Date,
    pub last_date: Date,
}

/// Read model of a scheduled or played match.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FixtureView {
    pub match_id: MatchId,
    pub home_team_id: TeamId,
    pub away_team_id: TeamId,
    #[serde(with = "time::serde::rfc3339")]
    pub scheduled_at: OffsetDateTime,
    pub venue: Option<String>,
    pub status: MatchStatus,
    pub winner_team_id: Option<TeamId>,
    pub home_sets_won: i64,
    pub away_sets_won: i64,
}

impl From<MatchEntity> for FixtureView {
    fn from(entity: MatchEntity) -> Self {
        Self {
            match_id: entity.id,
            home_team_id: entity.home_team_id,
            away_team_id: entity.away_team_id,
            scheduled_at: entity.scheduled_at,
            venue: entity.venue,
            status: entity.status,
            winner_team_id: entity.winner_team_id,
            home_sets_won: entity.home_sets_won,
            away_sets_won: entity.away_sets_won,
        }
    }
}

#[cfg(test)]
mod tests {
    use time::macros::date;

    use super::*;

    #[test]
    fn omitted_fields_deserialize_to_defaults() {
        let request: GenerateFixturesRequest =
            serde_json::from_str(r#"{"season_id": 4, "start_date": "2025-09-01"}"#).unwrap();
        assert_eq!(request.season_id, 4);
        assert_eq!(request.start_date, date!(2025 - 09 - 01));
        assert!(request.matches_per_period.is_none());
        assert!(!request.double_round_robin);
        assert!(!request.shuffle);
        assert!(request.validate().is_ok());
    }

    #[test]
    fn zero_period_and_bad_weekdays_are_reported_together() {
        let mut request = GenerateFixturesRequest::new(1, date!(2025 - 09 - 01));
        request.period_weeks = Some(0);
        request.allowed_weekdays = Some(vec![false; 7]);

        let errors = request.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("period_weeks"));
        assert!(fields.contains_key("allowed_weekdays"));
    }
}
