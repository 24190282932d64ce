use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use sqlx::types::Json;
use sqlx::PgPool;

use super::store::{DocPath, DocumentStore, StoreError};

/// Documents persisted in one Postgres table keyed by `(collection, doc_id)`
/// with a JSONB body. See `migrations/`.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(20)
            .acquire_timeout(std::time::Duration::from_secs(5))
            .connect(database_url)
            .await?;
        Ok(Self { pool })
    }

    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

impl DocumentStore for PgStore {
    async fn put(&self, path: &DocPath, body: &Value) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO documents (collection, doc_id, body)
            VALUES ($1, $2, $3)
            ON CONFLICT (collection, doc_id) DO UPDATE SET
                body = EXCLUDED.body,
                updated_at = NOW()
            "#,
        )
        .bind(path.collection())
        .bind(path.id())
        .bind(Json(body))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get(&self, path: &DocPath) -> Result<Option<Value>, StoreError> {
        let body = sqlx::query_scalar::<_, Json<Value>>(
            "SELECT body FROM documents WHERE collection = $1 AND doc_id = $2",
        )
        .bind(path.collection())
        .bind(path.id())
        .fetch_optional(&self.pool)
        .await?;
        Ok(body.map(|Json(v)| v))
    }

    async fn list(&self, collection: &str) -> Result<Vec<(String, Value)>, StoreError> {
        let rows = sqlx::query_as::<_, (String, Json<Value>)>(
            "SELECT doc_id, body FROM documents WHERE collection = $1",
        )
        .bind(collection)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(|(id, Json(body))| (id, body)).collect())
    }

    async fn list_in_range(
        &self,
        collection: &str,
        field: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<(String, Value)>, StoreError> {
        let rows = sqlx::query_as::<_, (String, Json<Value>)>(
            r#"
            SELECT doc_id, body FROM documents
            WHERE collection = $1
              AND body ? $2
              AND (body ->> $2)::timestamptz BETWEEN $3 AND $4
            "#,
        )
        .bind(collection)
        .bind(field)
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(|(id, Json(body))| (id, body)).collect())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(())
    }
}
