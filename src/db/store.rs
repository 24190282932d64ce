use std::fmt;

use chrono::{DateTime, Utc};
use serde_json::Value;

use super::memory::MemoryStore;
use super::postgres::PgStore;

/// Postgres SQLSTATE for `insufficient_privilege`.
const PG_INSUFFICIENT_PRIVILEGE: &str = "42501";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Store unavailable: {0}")]
    Unavailable(#[source] sqlx::Error),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Malformed document at {path}: {reason}")]
    Malformed { path: String, reason: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[source] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed => StoreError::Unavailable(e),
            sqlx::Error::Database(ref db)
                if db.code().as_deref() == Some(PG_INSUFFICIENT_PRIVILEGE) =>
            {
                StoreError::PermissionDenied(db.message().to_string())
            }
            other => StoreError::Database(other),
        }
    }
}

impl StoreError {
    pub fn malformed(path: impl fmt::Display, reason: impl fmt::Display) -> Self {
        StoreError::Malformed {
            path: path.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Location of one document: the collection path plus the document id, e.g.
/// `users/u1/dailyCheckIns` + `2024-06-10`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DocPath {
    collection: String,
    id: String,
}

impl DocPath {
    pub fn new(collection: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            id: id.into(),
        }
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

impl fmt::Display for DocPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.collection, self.id)
    }
}

/// A document store addressed by collection path and document id.
///
/// Writes replace the whole document. Reads return `(id, body)` pairs in no
/// particular order.
#[allow(async_fn_in_trait)]
pub trait DocumentStore {
    /// Insert or replace the document at `path`.
    async fn put(&self, path: &DocPath, body: &Value) -> Result<(), StoreError>;

    async fn get(&self, path: &DocPath) -> Result<Option<Value>, StoreError>;

    async fn list(&self, collection: &str) -> Result<Vec<(String, Value)>, StoreError>;

    /// Documents whose timestamp `field` lies in `[start, end]`, both ends
    /// inclusive.
    async fn list_in_range(
        &self,
        collection: &str,
        field: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<(String, Value)>, StoreError>;

    async fn ping(&self) -> Result<(), StoreError>;
}

/// Store backend chosen at startup.
/// An enum rather than `Box<dyn DocumentStore>` because the trait uses async fns.
#[derive(Clone)]
pub enum Store {
    Memory(MemoryStore),
    Postgres(PgStore),
}

impl Store {
    pub fn backend_name(&self) -> &'static str {
        match self {
            Store::Memory(_) => "memory",
            Store::Postgres(_) => "postgres",
        }
    }

    /// Release the backend's connections. Further calls fail.
    pub async fn close(&self) {
        match self {
            Store::Memory(_) => {}
            Store::Postgres(s) => s.close().await,
        }
    }
}

impl DocumentStore for Store {
    async fn put(&self, path: &DocPath, body: &Value) -> Result<(), StoreError> {
        match self {
            Store::Memory(s) => s.put(path, body).await,
            Store::Postgres(s) => s.put(path, body).await,
        }
    }

    async fn get(&self, path: &DocPath) -> Result<Option<Value>, StoreError> {
        match self {
            Store::Memory(s) => s.get(path).await,
            Store::Postgres(s) => s.get(path).await,
        }
    }

    async fn list(&self, collection: &str) -> Result<Vec<(String, Value)>, StoreError> {
        match self {
            Store::Memory(s) => s.list(collection).await,
            Store::Postgres(s) => s.list(collection).await,
        }
    }

    async fn list_in_range(
        &self,
        collection: &str,
        field: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<(String, Value)>, StoreError> {
        match self {
            Store::Memory(s) => s.list_in_range(collection, field, start, end).await,
            Store::Postgres(s) => s.list_in_range(collection, field, start, end).await,
        }
    }

    async fn ping(&self) -> Result<(), StoreError> {
        match self {
            Store::Memory(s) => s.ping().await,
            Store::Postgres(s) => s.ping().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_doc_path_display() {
        let path = DocPath::new("users/u1/dailyCheckIns", "2024-06-10");
        assert_eq!(path.to_string(), "users/u1/dailyCheckIns/2024-06-10");
        assert_eq!(path.collection(), "users/u1/dailyCheckIns");
        assert_eq!(path.id(), "2024-06-10");
    }

    #[test]
    fn test_connectivity_errors_are_unavailable() {
        assert!(matches!(
            StoreError::from(sqlx::Error::PoolTimedOut),
            StoreError::Unavailable(_)
        ));
        assert!(matches!(
            StoreError::from(sqlx::Error::RowNotFound),
            StoreError::Database(_)
        ));
    }
}
