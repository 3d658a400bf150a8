//! Validation helpers for DTOs.

use validator::ValidationError;

use crate::services::weekday::{WeekdayError, WeekdayMask};

/// Validates a weekday allow-list: seven flags, Monday first, at least one `true`.
///
/// # Examples
///
/// ```ignore
/// validate_weekdays(&[true; 7])         // Ok
/// validate_weekdays(&[true; 5])         // Err - wrong length
/// validate_weekdays(&[false; 7])        // Err - nothing allowed
/// ```
pub fn validate_weekdays(flags: &[bool]) -> Result<(), ValidationError> {
    match WeekdayMask::try_from(flags) {
        Ok(_) => Ok(()),
        Err(err) => {
            let code = match err {
                WeekdayError::WrongLength(_) => "weekdays_length",
                WeekdayError::NoneAllowed => "weekdays_empty",
                WeekdayError::BeyondCalendar(_) => "weekdays_calendar",
            };
            let mut validation = ValidationError::new(code);
            validation.message = Some(err.to_string().into());
            Err(validation)
        }
    }
}

/// Validates that a set was actually decided.
pub fn validate_set_score(home: u32, away: u32) -> Result<(), ValidationError> {
    if home == away {
        let mut err = ValidationError::new("set_tied");
        err.message = Some(format!("a set cannot end level ({home}-{away})").into());
        return Err(err);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_weekdays_valid() {
        assert!(validate_weekdays(&[true; 7]).is_ok());
        assert!(validate_weekdays(&[false, false, false, false, false, true, true]).is_ok());
    }

    #[test]
    fn test_validate_weekdays_invalid() {
        let err = validate_weekdays(&[true; 6]).unwrap_err();
        assert_eq!(err.code, "weekdays_length");
        let err = validate_weekdays(&[false; 7]).unwrap_err();
        assert_eq!(err.code, "weekdays_empty");
        assert!(validate_weekdays(&[]).is_err());
    }

    #[test]
    fn test_validate_set_score() {
        assert!(validate_set_score(25, 23).is_ok());
        assert!(validate_set_score(13, 15).is_ok());
        assert!(validate_set_score(25, 25).is_err());
    }
}
