use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};

use crate::identity::{same_iso_week, WeekId};

pub const PHQ9_ITEMS: usize = 9;
pub const GAD7_ITEMS: usize = 7;
/// Every PHQ-9 and GAD-7 item is scored 0 ("not at all") to 3 ("nearly every day").
pub const ANSWER_MAX: u8 = 3;

/// One PHQ-9 + GAD-7 submission per user per ISO week.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklySurvey {
    pub week_id: WeekId,
    pub phq9: [u8; PHQ9_ITEMS],
    pub gad7: [u8; GAD7_ITEMS],
    pub timestamp: DateTime<Utc>,
}

/// Body stored at `users/{userId}/weeklySurveys/{weekId}`.
#[derive(Debug, Serialize, Deserialize)]
pub struct SurveyDocument {
    pub phq9: [u8; PHQ9_ITEMS],
    pub gad7: [u8; GAD7_ITEMS],
    pub timestamp: DateTime<Utc>,
}

impl WeeklySurvey {
    pub fn to_document(&self) -> SurveyDocument {
        SurveyDocument {
            phq9: self.phq9,
            gad7: self.gad7,
            timestamp: self.timestamp,
        }
    }

    pub fn from_document(week_id: WeekId, doc: SurveyDocument) -> Self {
        Self {
            week_id,
            phq9: doc.phq9,
            gad7: doc.gad7,
            timestamp: doc.timestamp,
        }
    }

    pub fn phq9_total(&self) -> u8 {
        self.phq9.iter().sum()
    }

    pub fn gad7_total(&self) -> u8 {
        self.gad7.iter().sum()
    }

    /// Item 9 asks about thoughts of self-harm; any non-zero answer warrants
    /// follow-up regardless of the total.
    pub fn self_harm_flag(&self) -> bool {
        self.phq9[PHQ9_ITEMS - 1] > 0
    }

    pub fn scores(&self) -> SurveyScores {
        let phq9_total = self.phq9_total();
        let gad7_total = self.gad7_total();
        SurveyScores {
            phq9_total,
            phq9_severity: DepressionSeverity::from_total(phq9_total),
            gad7_total,
            gad7_severity: AnxietySeverity::from_total(gad7_total),
            self_harm_flag: self.self_harm_flag(),
        }
    }
}

/// PHQ-9 severity bands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DepressionSeverity {
    Minimal,
    Mild,
    Moderate,
    ModeratelySevere,
    Severe,
}

impl DepressionSeverity {
    pub fn from_total(total: u8) -> Self {
        match total {
            0..=4 => Self::Minimal,
            5..=9 => Self::Mild,
            10..=14 => Self::Moderate,
            15..=19 => Self::ModeratelySevere,
            _ => Self::Severe,
        }
    }
}

/// GAD-7 severity bands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnxietySeverity {
    Minimal,
    Mild,
    Moderate,
    Severe,
}

impl AnxietySeverity {
    pub fn from_total(total: u8) -> Self {
        match total {
            0..=4 => Self::Minimal,
            5..=9 => Self::Mild,
            10..=14 => Self::Moderate,
            _ => Self::Severe,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SurveyScores {
    pub phq9_total: u8,
    pub phq9_severity: DepressionSeverity,
    pub gad7_total: u8,
    pub gad7_severity: AnxietySeverity,
    pub self_harm_flag: bool,
}

/// POST /api/surveys
#[derive(Debug, Deserialize)]
pub struct SubmitSurveyRequest {
    pub phq9: Vec<i32>,
    pub gad7: Vec<i32>,
}

/// Survey with its computed scores (POST /api/surveys, GET /api/surveys/*)
#[derive(Debug, Serialize)]
pub struct SurveyResponse {
    #[serde(flatten)]
    pub survey: WeeklySurvey,
    pub scores: SurveyScores,
    /// Submitted during the ISO week containing `now`.
    pub current_week: bool,
}

impl SurveyResponse {
    pub fn new(survey: WeeklySurvey, now: DateTime<FixedOffset>) -> Self {
        let submitted = survey.timestamp.with_timezone(now.offset());
        Self {
            scores: survey.scores(),
            current_week: same_iso_week(&submitted, &now),
            survey,
        }
    }
}
