use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::identity::CalendarDate;

/// Emotion label → rating. Labels outside the shared emotion set are kept as
/// given.
pub type EmotionRatings = BTreeMap<String, i32>;

/// Default look-back when a history query omits `start`.
pub const DEFAULT_HISTORY_DAYS: i64 = 30;

/// One check-in per user per local calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyCheckIn {
    pub date: CalendarDate,
    pub emotions: EmotionRatings,
    pub timestamp: DateTime<Utc>,
}

/// Body stored at `users/{userId}/dailyCheckIns/{date}`; the date is the
/// document id.
#[derive(Debug, Serialize, Deserialize)]
pub struct CheckInDocument {
    pub emotions: EmotionRatings,
    pub timestamp: DateTime<Utc>,
}

impl DailyCheckIn {
    pub fn to_document(&self) -> CheckInDocument {
        CheckInDocument {
            emotions: self.emotions.clone(),
            timestamp: self.timestamp,
        }
    }

    pub fn from_document(date: CalendarDate, doc: CheckInDocument) -> Self {
        Self {
            date,
            emotions: doc.emotions,
            timestamp: doc.timestamp,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SubmitCheckInRequest {
    pub emotions: EmotionRatings,
}

#[derive(Debug, Deserialize)]
pub struct MoodHistoryQuery {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl MoodHistoryQuery {
    /// Resolve the inclusive `[start, end]` window, defaulting to the last
    /// 30 days up to `now`.
    pub fn window(&self, now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
        let end = self.end.unwrap_or(now);
        let start = self
            .start
            .unwrap_or_else(|| end - Duration::days(DEFAULT_HISTORY_DAYS));
        (start, end)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmotionStats {
    pub label: String,
    pub count: usize,
    pub mean: f64,
    pub min: i32,
    pub max: i32,
}

/// GET /api/check-ins/summary
#[derive(Debug, Serialize)]
pub struct MoodSummary {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub check_ins: usize,
    pub emotions: Vec<EmotionStats>,
}

impl MoodSummary {
    pub fn from_history(start: DateTime<Utc>, end: DateTime<Utc>, history: &[DailyCheckIn]) -> Self {
        let mut acc: BTreeMap<&str, (usize, i64, i32, i32)> = BTreeMap::new();
        for check_in in history {
            for (label, &rating) in &check_in.emotions {
                let entry = acc.entry(label.as_str()).or_insert((0, 0, rating, rating));
                entry.0 += 1;
                entry.1 += i64::from(rating);
                entry.2 = entry.2.min(rating);
                entry.3 = entry.3.max(rating);
            }
        }

        let emotions = acc
            .into_iter()
            .map(|(label, (count, sum, min, max))| EmotionStats {
                label: label.to_string(),
                count,
                mean: sum as f64 / count as f64,
                min,
                max,
            })
            .collect();

        Self {
            start,
            end,
            check_ins: history.len(),
            emotions,
        }
    }
}
