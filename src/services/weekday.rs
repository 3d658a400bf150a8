use thiserror::Error;
use time::{Date, Duration, Weekday};

use crate::error::ServiceError;

/// Reasons an allow-list of weekdays cannot be used for scheduling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WeekdayError {
    #[error("allowed weekdays must list exactly 7 days (Monday first), got {0}")]
    WrongLength(usize),
    #[error("at least one weekday must be allowed")]
    NoneAllowed,
    #[error("no allowed weekday on or after {0} within the supported calendar")]
    BeyondCalendar(Date),
}

impl From<WeekdayError> for ServiceError {
    fn from(err: WeekdayError) -> Self {
        ServiceError::Configuration(err.to_string())
    }
}

/// Days of the week on which matches may be played, indexed Monday = 0 .. Sunday = 6.
///
/// A mask always allows at least one day, which bounds [`WeekdayMask::resolve`] to a
/// six-day forward scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeekdayMask([bool; 7]);

impl WeekdayMask {
    pub fn all() -> Self {
        Self([true; 7])
    }

    pub fn allows(&self, weekday: Weekday) -> bool {
        self.0[usize::from(weekday.number_days_from_monday())]
    }

    /// Earliest date on or after `candidate` that falls on an allowed weekday.
    ///
    /// `None` when the scan would run past [`Date::MAX`].
    pub fn resolve(&self, candidate: Date) -> Option<Date> {
        (0..7)
            .map_while(|offset| candidate.checked_add(Duration::days(offset)))
            .find(|date| self.allows(date.weekday()))
    }

    pub fn as_flags(&self) -> [bool; 7] {
        self.0
    }
}

impl Default for WeekdayMask {
    fn default() -> Self {
        Self::all()
    }
}

impl TryFrom<&[bool]> for WeekdayMask {
    type Error = WeekdayError;

    fn try_from(flags: &[bool]) -> Result<Self, Self::Error> {
        let flags: [bool; 7] = flags
            .try_into()
            .map_err(|_| WeekdayError::WrongLength(flags.len()))?;
        if !flags.contains(&true) {
            return Err(WeekdayError::NoneAllowed);
        }
        Ok(Self(flags))
    }
}

/// Snap `candidate` forward to the next allowed weekday described by a raw allow-list.
pub fn next_allowed_date(candidate: Date, allowed: &[bool]) -> Result<Date, WeekdayError> {
    WeekdayMask::try_from(allowed)?
        .resolve(candidate)
        .ok_or(WeekdayError::BeyondCalendar(candidate))
}
