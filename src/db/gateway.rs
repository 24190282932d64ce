use chrono::{DateTime, Utc};
use serde_json::Value;

use super::store::{DocPath, DocumentStore, Store, StoreError};
use crate::identity::{CalendarDate, WeekId};
use crate::models::check_in::{CheckInDocument, DailyCheckIn};
use crate::models::emotion::{RATING_MAX, RATING_MIN};
use crate::models::survey::{SurveyDocument, WeeklySurvey, ANSWER_MAX};
use crate::models::user::UserId;

const DAILY_CHECK_INS: &str = "dailyCheckIns";
const WEEKLY_SURVEYS: &str = "weeklySurveys";
const TIMESTAMP_FIELD: &str = "timestamp";

fn user_collection(user: &UserId, kind: &str) -> String {
    format!("users/{}/{}", user, kind)
}

/// Reads and writes check-ins and surveys under each user's namespace:
///
/// ```text
/// users/{userId}/dailyCheckIns/{YYYY-MM-DD}
/// users/{userId}/weeklySurveys/{YYYY-Www}
/// ```
///
/// Every write is a whole-document upsert, so a second submission for the
/// same key replaces the first. Nothing is cached and nothing is retried.
#[derive(Clone)]
pub struct StoreGateway {
    store: Store,
}

impl StoreGateway {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub async fn put_daily_check_in(
        &self,
        user: &UserId,
        record: &DailyCheckIn,
    ) -> Result<(), StoreError> {
        let path = DocPath::new(user_collection(user, DAILY_CHECK_INS), record.date.to_string());
        let body = serde_json::to_value(record.to_document())?;
        self.store.put(&path, &body).await?;
        tracing::debug!(user_id = %user, key = %record.date, "Daily check-in stored");
        Ok(())
    }

    pub async fn put_weekly_survey(
        &self,
        user: &UserId,
        record: &WeeklySurvey,
    ) -> Result<(), StoreError> {
        let path = DocPath::new(user_collection(user, WEEKLY_SURVEYS), record.week_id.to_string());
        let body = serde_json::to_value(record.to_document())?;
        self.store.put(&path, &body).await?;
        tracing::debug!(user_id = %user, key = %record.week_id, "Weekly survey stored");
        Ok(())
    }

    pub async fn get_daily_check_in(
        &self,
        user: &UserId,
        date: CalendarDate,
    ) -> Result<Option<DailyCheckIn>, StoreError> {
        let collection = user_collection(user, DAILY_CHECK_INS);
        let path = DocPath::new(collection.as_str(), date.to_string());
        match self.store.get(&path).await? {
            Some(body) => decode_check_in(&collection, path.id(), body).map(Some),
            None => Ok(None),
        }
    }

    pub async fn get_weekly_survey(
        &self,
        user: &UserId,
        week: WeekId,
    ) -> Result<Option<WeeklySurvey>, StoreError> {
        let collection = user_collection(user, WEEKLY_SURVEYS);
        let path = DocPath::new(collection.as_str(), week.to_string());
        match self.store.get(&path).await? {
            Some(body) => decode_survey(&collection, path.id(), body).map(Some),
            None => Ok(None),
        }
    }

    /// Check-ins whose `timestamp` lies in `[start, end]`, inclusive on both
    /// ends. Unordered.
    pub async fn get_mood_history(
        &self,
        user: &UserId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<DailyCheckIn>, StoreError> {
        let collection = user_collection(user, DAILY_CHECK_INS);
        self.store
            .list_in_range(&collection, TIMESTAMP_FIELD, start, end)
            .await?
            .into_iter()
            .map(|(id, body)| decode_check_in(&collection, &id, body))
            .collect()
    }

    /// Every weekly survey the user has submitted. Unordered.
    pub async fn get_weekly_survey_history(
        &self,
        user: &UserId,
    ) -> Result<Vec<WeeklySurvey>, StoreError> {
        let collection = user_collection(user, WEEKLY_SURVEYS);
        self.store
            .list(&collection)
            .await?
            .into_iter()
            .map(|(id, body)| decode_survey(&collection, &id, body))
            .collect()
    }
}

fn decode_check_in(collection: &str, id: &str, body: Value) -> Result<DailyCheckIn, StoreError> {
    let path = DocPath::new(collection, id);
    let date: CalendarDate = id.parse().map_err(|e| StoreError::malformed(&path, e))?;
    let doc: CheckInDocument =
        serde_json::from_value(body).map_err(|e| StoreError::malformed(&path, e))?;
    if let Some((label, rating)) = doc
        .emotions
        .iter()
        .find(|(_, r)| !(RATING_MIN..=RATING_MAX).contains(*r))
    {
        return Err(StoreError::malformed(
            &path,
            format!("rating {rating} for '{label}' outside {RATING_MIN}..={RATING_MAX}"),
        ));
    }
    Ok(DailyCheckIn::from_document(date, doc))
}

fn decode_survey(collection: &str, id: &str, body: Value) -> Result<WeeklySurvey, StoreError> {
    let path = DocPath::new(collection, id);
    let week: WeekId = id.parse().map_err(|e| StoreError::malformed(&path, e))?;
    let doc: SurveyDocument =
        serde_json::from_value(body).map_err(|e| StoreError::malformed(&path, e))?;
    if doc.phq9.iter().chain(doc.gad7.iter()).any(|&a| a > ANSWER_MAX) {
        return Err(StoreError::malformed(&path, "answer outside 0..=3"));
    }
    Ok(WeeklySurvey::from_document(week, doc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory::MemoryStore;
    use serde_json::json;

    fn gateway() -> (StoreGateway, MemoryStore) {
        let memory = MemoryStore::new();
        (StoreGateway::new(Store::Memory(memory.clone())), memory)
    }

    fn user(id: &str) -> UserId {
        UserId::parse(id).unwrap()
    }

    fn ts(raw: &str) -> DateTime<Utc> {
        raw.parse().unwrap()
    }

    fn check_in(date: &str, at: &str, ratings: &[(&str, i32)]) -> DailyCheckIn {
        DailyCheckIn {
            date: date.parse().unwrap(),
            emotions: ratings.iter().map(|(l, r)| (l.to_string(), *r)).collect(),
            timestamp: ts(at),
        }
    }

    fn survey(week: &str, phq9: [u8; 9]) -> WeeklySurvey {
        WeeklySurvey {
            week_id: week.parse().unwrap(),
            phq9,
            gad7: [1; 7],
            timestamp: ts("2024-06-12T18:00:00Z"),
        }
    }

    #[tokio::test]
    async fn test_put_daily_check_in_is_idempotent_last_write_wins() {
        let (gateway, memory) = gateway();
        let u = user("u1");

        let first = check_in("2024-06-10", "2024-06-10T08:00:00Z", &[("Calm", 2)]);
        let second = check_in("2024-06-10", "2024-06-10T21:00:00Z", &[("Calm", 5), ("Sad", 1)]);
        gateway.put_daily_check_in(&u, &first).await.unwrap();
        gateway.put_daily_check_in(&u, &second).await.unwrap();

        assert_eq!(memory.document_count("users/u1/dailyCheckIns").await, 1);
        let stored = gateway
            .get_daily_check_in(&u, "2024-06-10".parse().unwrap())
            .await
            .unwrap();
        assert_eq!(stored, Some(second));
    }

    #[tokio::test]
    async fn test_documents_follow_path_layout() {
        let (gateway, memory) = gateway();
        let u = user("u1");
        gateway
            .put_daily_check_in(&u, &check_in("2024-06-10", "2024-06-10T08:00:00Z", &[("Excited", 4)]))
            .await
            .unwrap();
        gateway.put_weekly_survey(&u, &survey("2024-W24", [0; 9])).await.unwrap();

        let body = memory
            .get(&DocPath::new("users/u1/dailyCheckIns", "2024-06-10"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            body,
            json!({ "emotions": { "Excited": 4 }, "timestamp": "2024-06-10T08:00:00Z" })
        );

        let body = memory
            .get(&DocPath::new("users/u1/weeklySurveys", "2024-W24"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(body["phq9"], json!([0, 0, 0, 0, 0, 0, 0, 0, 0]));
        assert_eq!(body["gad7"], json!([1, 1, 1, 1, 1, 1, 1]));
        assert!(body.get("week_id").is_none());
    }

    #[tokio::test]
    async fn test_mood_history_includes_end_boundary() {
        let (gateway, _) = gateway();
        let u = user("u1");
        let boundary = check_in("2024-06-10", "2024-06-10T00:00:00Z", &[("Sad", 3)]);
        gateway.put_daily_check_in(&u, &boundary).await.unwrap();
        gateway
            .put_daily_check_in(&u, &check_in("2024-06-11", "2024-06-11T00:00:01Z", &[("Sad", 2)]))
            .await
            .unwrap();

        let history = gateway
            .get_mood_history(&u, ts("2024-06-01T00:00:00Z"), ts("2024-06-10T00:00:00Z"))
            .await
            .unwrap();
        assert_eq!(history, vec![boundary.clone()]);

        // start boundary is inclusive too
        let history = gateway
            .get_mood_history(&u, ts("2024-06-10T00:00:00Z"), ts("2024-06-10T00:00:00Z"))
            .await
            .unwrap();
        assert_eq!(history, vec![boundary]);
    }

    #[tokio::test]
    async fn test_history_is_scoped_per_user() {
        let (gateway, _) = gateway();
        gateway
            .put_daily_check_in(&user("alice"), &check_in("2024-06-10", "2024-06-10T08:00:00Z", &[("Calm", 3)]))
            .await
            .unwrap();
        gateway.put_weekly_survey(&user("alice"), &survey("2024-W24", [0; 9])).await.unwrap();

        let bob = user("bob");
        assert!(gateway
            .get_mood_history(&bob, ts("2024-01-01T00:00:00Z"), ts("2025-01-01T00:00:00Z"))
            .await
            .unwrap()
            .is_empty());
        assert!(gateway.get_weekly_survey_history(&bob).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_weekly_survey_upsert_and_history() {
        let (gateway, _) = gateway();
        let u = user("u1");
        gateway.put_weekly_survey(&u, &survey("2024-W24", [0; 9])).await.unwrap();
        gateway.put_weekly_survey(&u, &survey("2024-W24", [2; 9])).await.unwrap();
        gateway.put_weekly_survey(&u, &survey("2025-W01", [1; 9])).await.unwrap();

        let mut history = gateway.get_weekly_survey_history(&u).await.unwrap();
        history.sort_by_key(|s| s.week_id);
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].phq9, [2; 9]);
        assert_eq!(history[1].week_id.to_string(), "2025-W01");

        let missing = gateway
            .get_weekly_survey(&u, "2024-W25".parse().unwrap())
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_malformed_remote_data_is_a_store_error() {
        let (gateway, memory) = gateway();
        let u = user("u1");
        memory
            .put(
                &DocPath::new("users/u1/weeklySurveys", "2024-W24"),
                &json!({ "phq9": [9, 0, 0, 0, 0, 0, 0, 0, 0], "gad7": [0, 0, 0, 0, 0, 0, 0], "timestamp": "2024-06-12T18:00:00Z" }),
            )
            .await
            .unwrap();
        memory
            .put(
                &DocPath::new("users/u1/dailyCheckIns", "not-a-date"),
                &json!({ "emotions": {}, "timestamp": "2024-06-12T18:00:00Z" }),
            )
            .await
            .unwrap();

        assert!(matches!(
            gateway.get_weekly_survey_history(&u).await,
            Err(StoreError::Malformed { .. })
        ));
        assert!(matches!(
            gateway
                .get_mood_history(&u, ts("2024-06-01T00:00:00Z"), ts("2024-06-30T00:00:00Z"))
                .await,
            Err(StoreError::Malformed { .. })
        ));
    }

    #[tokio::test]
    async fn test_stored_rating_out_of_range_is_malformed() {
        let (gateway, memory) = gateway();
        let u = user("u1");
        memory
            .put(
                &DocPath::new("users/u1/dailyCheckIns", "2024-06-10"),
                &json!({ "emotions": { "Calm": 9 }, "timestamp": "2024-06-10T18:00:00Z" }),
            )
            .await
            .unwrap();

        let date: CalendarDate = "2024-06-10".parse().unwrap();
        assert!(matches!(
            gateway.get_daily_check_in(&u, date).await,
            Err(StoreError::Malformed { .. })
        ));
        assert!(matches!(
            gateway
                .get_mood_history(&u, ts("2024-06-01T00:00:00Z"), ts("2024-06-30T00:00:00Z"))
                .await,
            Err(StoreError::Malformed { .. })
        ));
    }
}
