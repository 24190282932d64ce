use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Value;
use tokio::sync::RwLock;

use super::store::{DocPath, DocumentStore, StoreError};

type Collections = BTreeMap<String, BTreeMap<String, Value>>;

/// In-process document store (single-instance deployments and tests).
/// Contents are lost on restart.
#[derive(Clone, Default)]
pub struct MemoryStore {
    collections: Arc<RwLock<Collections>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub async fn document_count(&self, collection: &str) -> usize {
        self.collections
            .read()
            .await
            .get(collection)
            .map_or(0, BTreeMap::len)
    }
}

impl DocumentStore for MemoryStore {
    async fn put(&self, path: &DocPath, body: &Value) -> Result<(), StoreError> {
        let mut collections = self.collections.write().await;
        collections
            .entry(path.collection().to_string())
            .or_default()
            .insert(path.id().to_string(), body.clone());
        Ok(())
    }

    async fn get(&self, path: &DocPath) -> Result<Option<Value>, StoreError> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(path.collection())
            .and_then(|docs| docs.get(path.id()))
            .cloned())
    }

    async fn list(&self, collection: &str) -> Result<Vec<(String, Value)>, StoreError> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .map(|docs| docs.iter().map(|(id, body)| (id.clone(), body.clone())).collect())
            .unwrap_or_default())
    }

    async fn list_in_range(
        &self,
        collection: &str,
        field: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<(String, Value)>, StoreError> {
        let collections = self.collections.read().await;
        let Some(docs) = collections.get(collection) else {
            return Ok(Vec::new());
        };

        let mut matched = Vec::new();
        for (id, body) in docs {
            // documents without the field never match a range filter
            let Some(raw) = body.get(field) else {
                continue;
            };
            let at = raw
                .as_str()
                .and_then(|s| s.parse::<DateTime<Utc>>().ok())
                .ok_or_else(|| {
                    StoreError::malformed(
                        DocPath::new(collection, id.as_str()),
                        format!("'{field}' is not an ISO-8601 timestamp"),
                    )
                })?;
            if start <= at && at <= end {
                matched.push((id.clone(), body.clone()));
            }
        }
        Ok(matched)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ts(raw: &str) -> DateTime<Utc> {
        raw.parse().unwrap()
    }

    #[tokio::test]
    async fn test_put_replaces_whole_document() {
        let store = MemoryStore::new();
        let path = DocPath::new("users/u1/dailyCheckIns", "2024-06-10");

        store.put(&path, &json!({ "a": 1, "b": 2 })).await.unwrap();
        store.put(&path, &json!({ "a": 3 })).await.unwrap();

        assert_eq!(store.get(&path).await.unwrap(), Some(json!({ "a": 3 })));
        assert_eq!(store.document_count("users/u1/dailyCheckIns").await, 1);
    }

    #[tokio::test]
    async fn test_collections_are_isolated() {
        let store = MemoryStore::new();
        store
            .put(&DocPath::new("users/u1/weeklySurveys", "2024-W24"), &json!({}))
            .await
            .unwrap();

        assert!(store.list("users/u2/weeklySurveys").await.unwrap().is_empty());
        assert_eq!(store.list("users/u1/weeklySurveys").await.unwrap().len(), 1);
        assert!(store
            .get(&DocPath::new("users/u2/weeklySurveys", "2024-W24"))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_range_is_inclusive_and_skips_missing_field() {
        let store = MemoryStore::new();
        let collection = "users/u1/dailyCheckIns";
        for (id, at) in [
            ("2024-06-08", "2024-06-08T09:00:00Z"),
            ("2024-06-09", "2024-06-09T00:00:00Z"),
            ("2024-06-10", "2024-06-10T00:00:00Z"),
            ("2024-06-11", "2024-06-11T00:00:00.001Z"),
        ] {
            store
                .put(&DocPath::new(collection, id), &json!({ "timestamp": at }))
                .await
                .unwrap();
        }
        store
            .put(&DocPath::new(collection, "legacy"), &json!({ "emotions": {} }))
            .await
            .unwrap();

        let mut ids: Vec<_> = store
            .list_in_range(collection, "timestamp", ts("2024-06-09T00:00:00Z"), ts("2024-06-10T00:00:00Z"))
            .await
            .unwrap()
            .into_iter()
            .map(|(id, _)| id)
            .collect();
        ids.sort();
        assert_eq!(ids, ["2024-06-09", "2024-06-10"]);
    }

    #[tokio::test]
    async fn test_range_rejects_unparseable_timestamp() {
        let store = MemoryStore::new();
        store
            .put(&DocPath::new("c", "x"), &json!({ "timestamp": "yesterday" }))
            .await
            .unwrap();

        let err = store
            .list_in_range("c", "timestamp", ts("2024-01-01T00:00:00Z"), ts("2025-01-01T00:00:00Z"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Malformed { .. }));
    }
}
