use std::collections::HashMap;

use serde::Serialize;
use time::{Date, Duration};
use tracing::{debug, warn};

use crate::{
    config::SchedulingDefaults,
    dao::models::{MatchStatus, TeamId},
    error::ServiceError,
    services::{pairing::Pairing, weekday::WeekdayMask},
};

/// Constraints applied while spreading pairings over periods.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeriodRules {
    /// Matches a single team may play within one period.
    pub matches_per_period: u32,
    /// Length of one period in weeks. Must be at least one.
    pub period_weeks: u32,
    pub allowed_weekdays: WeekdayMask,
}

impl Default for PeriodRules {
    fn default() -> Self {
        SchedulingDefaults::default().into()
    }
}

impl From<SchedulingDefaults> for PeriodRules {
    fn from(defaults: SchedulingDefaults) -> Self {
        Self {
            matches_per_period: defaults.matches_per_period,
            period_weeks: defaults.period_weeks,
            allowed_weekdays: defaults.allowed_weekdays,
        }
    }
}

impl PeriodRules {
    fn period_date(&self, start: Date, period: i64) -> Result<Date, ServiceError> {
        let offset = Duration::weeks(period * i64::from(self.period_weeks));
        let candidate = start.checked_add(offset).ok_or_else(|| {
            ServiceError::Configuration(format!(
                "period {period} starts beyond the supported calendar"
            ))
        })?;
        self.allowed_weekdays.resolve(candidate).ok_or_else(|| {
            ServiceError::Configuration(format!(
                "period {period} has no allowed weekday within the supported calendar"
            ))
        })
    }
}

/// One pairing placed on the calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScheduledFixture {
    pub home: TeamId,
    pub away: TeamId,
    pub date: Date,
    pub status: MatchStatus,
}

impl ScheduledFixture {
    fn new(pairing: Pairing, date: Date) -> Self {
        Self {
            home: pairing.home,
            away: pairing.away,
            date,
            status: MatchStatus::Scheduled,
        }
    }
}

/// Greedily assign every pairing to a period, respecting the per-team cap.
///
/// Pairings are visited in input order each period. If a whole period places nothing while
/// pairings remain, every remaining pairing is placed on that period's date regardless of
/// the cap and scheduling stops, so the output always covers the whole input.
pub fn schedule(
    pairings: &[Pairing],
    start: Date,
    rules: &PeriodRules,
) -> Result<Vec<ScheduledFixture>, ServiceError> {
    if rules.period_weeks == 0 {
        return Err(ServiceError::Configuration(
            "period_weeks must be at least 1".into(),
        ));
    }

    let cap = rules.matches_per_period;
    let mut remaining = pairings.to_vec();
    let mut fixtures = Vec::with_capacity(pairings.len());
    let mut period: i64 = 0;

    while !remaining.is_empty() {
        let date = rules.period_date(start, period)?;
        let mut played: HashMap<TeamId, u32> = HashMap::new();
        let placed_before = fixtures.len();

        remaining.retain(|pairing| {
            let home = played.get(&pairing.home).copied().unwrap_or(0);
            let away = played.get(&pairing.away).copied().unwrap_or(0);
            if home >= cap || away >= cap {
                return true;
            }
            *played.entry(pairing.home).or_default() += 1;
            *played.entry(pairing.away).or_default() += 1;
            fixtures.push(ScheduledFixture::new(*pairing, date));
            false
        });

        let placed = fixtures.len() - placed_before;
        if placed == 0 {
            warn!(
                period,
                %date,
                cap,
                remaining = remaining.len(),
                "no pairing fits the per-period cap; placing the rest on this date"
            );
            fixtures.extend(
                remaining
                    .drain(..)
                    .map(|pairing| ScheduledFixture::new(pairing, date)),
            );
            break;
        }

        debug!(period, %date, placed, remaining = remaining.len(), "period scheduled");
        period += 1;
    }

    Ok(fixtures)
}
