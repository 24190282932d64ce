use serde::{Deserialize, Serialize};

/// Lowest rating on the mood slider.
pub const RATING_MIN: i32 = 1;
/// Highest rating on the mood slider.
pub const RATING_MAX: i32 = 5;
/// Slider position before the user touches it.
pub const DEFAULT_RATING: i32 = 3;

/// The emotions offered on the daily check-in, shared by the record builder
/// and every client rendering the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Emotion {
    Excited,
    Irritable,
    Calm,
    Sad,
    Energetic,
}

impl Emotion {
    pub const ALL: [Emotion; 5] = [
        Emotion::Excited,
        Emotion::Irritable,
        Emotion::Calm,
        Emotion::Sad,
        Emotion::Energetic,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Emotion::Excited => "Excited",
            Emotion::Irritable => "Irritable",
            Emotion::Calm => "Calm",
            Emotion::Sad => "Sad",
            Emotion::Energetic => "Energetic",
        }
    }

    pub fn emoji(self) -> &'static str {
        match self {
            Emotion::Excited => "😄",
            Emotion::Irritable => "😠",
            Emotion::Calm => "😌",
            Emotion::Sad => "😢",
            Emotion::Energetic => "⚡",
        }
    }

    /// Case-insensitive lookup; older clients sent lowercase labels.
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|e| e.label().eq_ignore_ascii_case(label))
    }
}

/// GET /api/emotions entry
#[derive(Debug, Serialize)]
pub struct EmotionDescriptor {
    pub label: &'static str,
    pub emoji: &'static str,
    pub min: i32,
    pub max: i32,
    pub default: i32,
}

impl From<Emotion> for EmotionDescriptor {
    fn from(emotion: Emotion) -> Self {
        Self {
            label: emotion.label(),
            emoji: emotion.emoji(),
            min: RATING_MIN,
            max: RATING_MAX,
            default: DEFAULT_RATING,
        }
    }
}

pub fn catalog() -> Vec<EmotionDescriptor> {
    Emotion::ALL.into_iter().map(EmotionDescriptor::from).collect()
}
