use chrono::{DateTime, Datelike, FixedOffset, NaiveTime, TimeZone, Utc, Weekday};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::user::UserId;
use crate::validation::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReminderKind {
    DailyCheckIn,
    WeeklySurvey,
}

impl ReminderKind {
    pub fn title(self) -> &'static str {
        match self {
            ReminderKind::DailyCheckIn => "🧠 Mood Check-In",
            ReminderKind::WeeklySurvey => "📋 Weekly Survey",
        }
    }

    pub fn body(self) -> &'static str {
        match self {
            ReminderKind::DailyCheckIn => "How are you feeling today? Tap to record your mood.",
            ReminderKind::WeeklySurvey => {
                "Take a few minutes to answer this week's PHQ-9 and GAD-7 questions."
            }
        }
    }
}

/// When to remind: a local time of day, optionally pinned to a weekday.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderSchedule {
    pub kind: ReminderKind,
    pub hour: u32,
    pub minute: u32,
    /// `None` fires every day.
    pub weekday: Option<Weekday>,
    pub repeats: bool,
}

impl ReminderSchedule {
    /// Repeating daily check-in reminder.
    #[cfg(test)]
    pub fn daily_check_in(hour: u32, minute: u32) -> Self {
        Self {
            kind: ReminderKind::DailyCheckIn,
            hour,
            minute,
            weekday: None,
            repeats: true,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        self.time_of_day().map(|_| ()).ok_or(ValidationError::InvalidTimeOfDay {
            hour: self.hour,
            minute: self.minute,
        })
    }

    pub fn time_of_day(&self) -> Option<NaiveTime> {
        NaiveTime::from_hms_opt(self.hour, self.minute, 0)
    }

    /// First matching instant strictly after `now`, in `now`'s offset.
    ///
    /// The offset is held fixed, so a daylight-saving change between now and
    /// the fire time shifts the reminder by the size of the change.
    pub fn next_fire_after(&self, now: DateTime<FixedOffset>) -> Option<DateTime<FixedOffset>> {
        let time = self.time_of_day()?;
        let offset = *now.offset();
        let mut date = now.date_naive();

        // today plus a full week covers every weekday
        for _ in 0..8 {
            let due = self.weekday.map_or(true, |w| date.weekday() == w);
            if due {
                let candidate = offset.from_local_datetime(&date.and_time(time)).single()?;
                if candidate > now {
                    return Some(candidate);
                }
            }
            date = date.succ_opt()?;
        }
        None
    }
}

/// PUT /api/reminders. Omitted time fields fall back to the configured
/// default reminder time.
#[derive(Debug, Deserialize)]
pub struct ScheduleReminderRequest {
    pub kind: ReminderKind,
    pub hour: Option<u32>,
    pub minute: Option<u32>,
    pub weekday: Option<Weekday>,
    pub repeats: Option<bool>,
}

impl ScheduleReminderRequest {
    pub fn into_schedule(self, default_hour: u32, default_minute: u32) -> ReminderSchedule {
        ReminderSchedule {
            kind: self.kind,
            hour: self.hour.unwrap_or(default_hour),
            minute: self.minute.unwrap_or(default_minute),
            weekday: self.weekday,
            repeats: self.repeats.unwrap_or(true),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ScheduledReminderInfo {
    pub id: Uuid,
    #[serde(flatten)]
    pub schedule: ReminderSchedule,
    pub next_fire_at: DateTime<FixedOffset>,
}

/// Published when a reminder comes due; pushed to the user's `/ws` sessions.
#[derive(Debug, Clone, Serialize)]
pub struct ReminderEvent {
    #[serde(rename = "type")]
    pub event_type: &'static str,
    pub user_id: UserId,
    pub kind: ReminderKind,
    pub title: &'static str,
    pub body: &'static str,
    pub fired_at: DateTime<Utc>,
}

impl ReminderEvent {
    pub fn new(user_id: UserId, kind: ReminderKind, fired_at: DateTime<Utc>) -> Self {
        Self {
            event_type: "reminder_due",
            user_id,
            kind,
            title: kind.title(),
            body: kind.body(),
            fired_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(rfc3339: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(rfc3339).unwrap()
    }

    #[test]
    fn test_daily_fires_later_today() {
        let schedule = ReminderSchedule::daily_check_in(20, 0);
        let next = schedule.next_fire_after(at("2024-06-10T09:15:00+02:00")).unwrap();
        assert_eq!(next, at("2024-06-10T20:00:00+02:00"));
    }

    #[test]
    fn test_daily_rolls_to_tomorrow_when_exactly_due() {
        let schedule = ReminderSchedule::daily_check_in(20, 0);
        let next = schedule.next_fire_after(at("2024-06-10T20:00:00+02:00")).unwrap();
        assert_eq!(next, at("2024-06-11T20:00:00+02:00"));
    }

    #[test]
    fn test_weekly_finds_next_weekday() {
        let schedule = ReminderSchedule {
            kind: ReminderKind::WeeklySurvey,
            hour: 18,
            minute: 30,
            weekday: Some(Weekday::Sun),
            repeats: true,
        };
        // Monday
        let next = schedule.next_fire_after(at("2024-06-10T08:00:00Z")).unwrap();
        assert_eq!(next, at("2024-06-16T18:30:00Z"));
        // Sunday, after the slot: a full week later
        let next = schedule.next_fire_after(at("2024-06-16T19:00:00Z")).unwrap();
        assert_eq!(next, at("2024-06-23T18:30:00Z"));
    }

    #[test]
    fn test_invalid_time_of_day() {
        let schedule = ReminderSchedule::daily_check_in(24, 0);
        assert_eq!(
            schedule.validate(),
            Err(ValidationError::InvalidTimeOfDay { hour: 24, minute: 0 })
        );
        assert!(schedule.next_fire_after(at("2024-06-10T08:00:00Z")).is_none());
        assert!(ReminderSchedule::daily_check_in(7, 60).validate().is_err());
    }

    #[test]
    fn test_request_defaults() {
        let request: ScheduleReminderRequest =
            serde_json::from_value(serde_json::json!({ "kind": "daily_check_in" })).unwrap();
        assert_eq!(request.into_schedule(20, 0), ReminderSchedule::daily_check_in(20, 0));

        let request: ScheduleReminderRequest = serde_json::from_value(serde_json::json!({
            "kind": "weekly_survey",
            "hour": 9,
            "weekday": "Sat",
            "repeats": false,
        }))
        .unwrap();
        let schedule = request.into_schedule(20, 0);
        assert_eq!(schedule.hour, 9);
        assert_eq!(schedule.minute, 0);
        assert_eq!(schedule.weekday, Some(Weekday::Sat));
        assert!(!schedule.repeats);
    }
}
