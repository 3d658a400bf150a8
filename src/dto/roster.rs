use serde::Serialize;
use time::Date;

use crate::dao::models::{SeasonId, TeamId};

/// Membership created by a roster registration.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RegisteredTeam {
    pub season_id: SeasonId,
    pub team_id: TeamId,
    pub team_name: String,
    pub joined_on: Date,
}
