use indexmap::IndexSet;
use rand::{Rng, seq::SliceRandom};
use serde::{Deserialize, Serialize};

use crate::{dao::models::TeamId, error::ServiceError};

/// Home/away tuple produced while building a fixture list. Never persisted on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pairing {
    pub home: TeamId,
    pub away: TeamId,
}

impl Pairing {
    pub fn new(home: TeamId, away: TeamId) -> Self {
        Self { home, away }
    }

    pub fn reversed(self) -> Self {
        Self::new(self.away, self.home)
    }

    pub fn involves(&self, team_id: TeamId) -> bool {
        self.home == team_id || self.away == team_id
    }
}

/// Build round-robin pairings following the order of `team_ids`.
///
/// Every unordered pair is emitted once in nested-loop order. With `double`, the reversed
/// pair of each is appended afterwards so every team hosts every opponent once.
pub fn round_robin(team_ids: &[TeamId], double: bool) -> Result<Vec<Pairing>, ServiceError> {
    let teams: IndexSet<TeamId> = team_ids.iter().copied().collect();
    if teams.len() != team_ids.len() {
        return Err(ServiceError::Configuration(
            "team list contains duplicate ids".into(),
        ));
    }

    let mut pairings = Vec::with_capacity(teams.len() * teams.len().saturating_sub(1));
    for (index, &home) in teams.iter().enumerate() {
        for &away in teams.iter().skip(index + 1) {
            pairings.push(Pairing::new(home, away));
        }
    }

    if double {
        let reciprocals: Vec<Pairing> = pairings.iter().map(|pairing| pairing.reversed()).collect();
        pairings.extend(reciprocals);
    }

    Ok(pairings)
}

/// Randomly permute pairings in place.
pub fn shuffle_pairings<R: Rng + ?Sized>(pairings: &mut [Pairing], rng: &mut R) {
    pairings.shuffle(rng);
}
