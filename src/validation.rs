//! Input validation for check-ins, surveys and reminders.

/// Input outside its domain. Raised before anything reaches the store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Rating for '{label}' must be between {min} and {max}, got {value}")]
    RatingOutOfRange {
        label: String,
        value: i32,
        min: i32,
        max: i32,
    },

    #[error("{survey} requires exactly {expected} answers, got {actual}")]
    WrongAnswerCount {
        survey: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("{survey} item {item} must be between 0 and {max}, got {value}")]
    AnswerOutOfRange {
        survey: &'static str,
        item: usize,
        value: i32,
        max: u8,
    },

    #[error("Reminder time {hour:02}:{minute:02} is not a valid time of day")]
    InvalidTimeOfDay { hour: u32, minute: u32 },

    /// Well-formed JSON whose values have the wrong shape, e.g. a fractional
    /// rating.
    #[error("Invalid request body: {0}")]
    InvalidBody(String),
}

/// Check that `value` lies in `min..=max` for the named emotion.
pub fn validate_rating(label: &str, value: i32, min: i32, max: i32) -> Result<(), ValidationError> {
    if !(min..=max).contains(&value) {
        return Err(ValidationError::RatingOutOfRange {
            label: label.to_string(),
            value,
            min,
            max,
        });
    }
    Ok(())
}

/// Check a questionnaire's answer sheet: exactly `N` answers, each in
/// `0..=max`. Items are reported 1-based, the way the questionnaires number
/// them.
pub fn validate_answers<const N: usize>(
    survey: &'static str,
    raw: &[i32],
    max: u8,
) -> Result<[u8; N], ValidationError> {
    if raw.len() != N {
        return Err(ValidationError::WrongAnswerCount {
            survey,
            expected: N,
            actual: raw.len(),
        });
    }

    let mut answers = [0u8; N];
    for (index, (slot, &value)) in answers.iter_mut().zip(raw).enumerate() {
        if !(0..=i32::from(max)).contains(&value) {
            return Err(ValidationError::AnswerOutOfRange {
                survey,
                item: index + 1,
                value,
                max,
            });
        }
        *slot = value as u8;
    }
    Ok(answers)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_rating_bounds_inclusive() {
        assert!(validate_rating("Calm", 1, 1, 5).is_ok());
        assert!(validate_rating("Calm", 5, 1, 5).is_ok());
        assert_eq!(
            validate_rating("Calm", 6, 1, 5),
            Err(ValidationError::RatingOutOfRange {
                label: "Calm".into(),
                value: 6,
                min: 1,
                max: 5,
            })
        );
        assert!(validate_rating("Calm", 0, 1, 5).is_err());
    }

    #[test]
    fn test_validate_answers_length() {
        let err = validate_answers::<9>("PHQ-9", &[0; 8], 3).unwrap_err();
        assert_eq!(
            err,
            ValidationError::WrongAnswerCount {
                survey: "PHQ-9",
                expected: 9,
                actual: 8,
            }
        );
        assert!(validate_answers::<7>("GAD-7", &[0; 8], 3).is_err());
    }

    #[test]
    fn test_validate_answers_reports_one_based_item() {
        let err = validate_answers::<7>("GAD-7", &[0, 1, 2, 3, -1, 0, 0], 3).unwrap_err();
        assert_eq!(
            err,
            ValidationError::AnswerOutOfRange {
                survey: "GAD-7",
                item: 5,
                value: -1,
                max: 3,
            }
        );
        assert_eq!(err.to_string(), "GAD-7 item 5 must be between 0 and 3, got -1");
    }

    #[test]
    fn test_validate_answers_converts() {
        let answers = validate_answers::<7>("GAD-7", &[0, 1, 2, 3, 3, 2, 1], 3).unwrap();
        assert_eq!(answers, [0, 1, 2, 3, 3, 2, 1]);
    }
}
