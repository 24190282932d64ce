use axum::Json;

use crate::models::emotion::{catalog, EmotionDescriptor};

/// The shared emotion set, so clients render the same sliders the record
/// builder expects.
pub async fn list_emotions() -> Json<Vec<EmotionDescriptor>> {
    Json(catalog())
}
