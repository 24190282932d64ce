use std::sync::Arc;

use chrono::{DateTime, FixedOffset, SubsecRound, Utc};

use crate::identity::{CalendarDate, Clock, WeekId};
use crate::models::check_in::{DailyCheckIn, EmotionRatings};
use crate::models::emotion::{Emotion, RATING_MAX, RATING_MIN};
use crate::models::survey::{WeeklySurvey, ANSWER_MAX, GAD7_ITEMS, PHQ9_ITEMS};
use crate::validation::{validate_answers, validate_rating, ValidationError};

/// Turns raw form input into keyed, timestamped records.
///
/// Holds nothing between calls except the clock it reads.
#[derive(Clone)]
pub struct RecordBuilder {
    clock: Arc<dyn Clock>,
}

impl RecordBuilder {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    pub fn now(&self) -> DateTime<FixedOffset> {
        self.clock.now()
    }

    pub fn today(&self) -> CalendarDate {
        CalendarDate::of(&self.clock.now())
    }

    pub fn current_week_id(&self) -> WeekId {
        WeekId::of(&self.clock.now())
    }

    /// Fails iff a rating lies outside 1..=5. Labels outside the shared
    /// emotion set are stored as given.
    pub fn build_daily_check_in(
        &self,
        emotions: EmotionRatings,
    ) -> Result<DailyCheckIn, ValidationError> {
        for (label, &value) in &emotions {
            validate_rating(label, value, RATING_MIN, RATING_MAX)?;
            if Emotion::from_label(label).is_none() {
                tracing::debug!(label = %label, "Unrecognized emotion label kept as given");
            }
        }

        let now = self.clock.now();
        Ok(DailyCheckIn {
            date: CalendarDate::of(&now),
            emotions,
            timestamp: instant(now),
        })
    }

    /// Fails unless `phq9` has 9 answers and `gad7` has 7, each in 0..=3.
    pub fn build_weekly_survey(
        &self,
        phq9: &[i32],
        gad7: &[i32],
    ) -> Result<WeeklySurvey, ValidationError> {
        let phq9 = validate_answers::<PHQ9_ITEMS>("PHQ-9", phq9, ANSWER_MAX)?;
        let gad7 = validate_answers::<GAD7_ITEMS>("GAD-7", gad7, ANSWER_MAX)?;

        let now = self.clock.now();
        Ok(WeeklySurvey {
            week_id: WeekId::of(&now),
            phq9,
            gad7,
            timestamp: instant(now),
        })
    }
}

/// Millisecond precision, the resolution clients have always sent.
fn instant(now: DateTime<FixedOffset>) -> DateTime<Utc> {
    now.with_timezone(&Utc).trunc_subsecs(3)
}
