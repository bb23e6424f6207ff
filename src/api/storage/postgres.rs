//! PostgreSQL document store.
//!
//! All collections share one `documents` table holding JSONB bodies. Filters
//! become `@>` containment checks and each array operation is a single
//! `UPDATE`, so every call stays atomic for the one document it touches.

use super::{Collection, DocumentStore, Filter, PullMatcher, StorageError};
use async_trait::async_trait;
use serde_json::{Map, Value};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

/// PostgreSQL storage backend implementation.
pub struct PostgresDocumentStore {
    pool: PgPool,
}

impl PostgresDocumentStore {
    /// Create a new PostgreSQL document store from an existing pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect and run pending migrations.
    pub async fn connect(database_url: &str) -> Result<Self, StorageError> {
        let pool = PgPool::connect(database_url).await.map_err(|e| {
            StorageError::ConnectionError(format!("Failed to connect to database: {}", e))
        })?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| StorageError::ConnectionError(format!("Migration failed: {}", e)))?;

        info!("[Storage] PostgreSQL document store ready");
        Ok(Self::new(pool))
    }
}

#[async_trait]
impl DocumentStore for PostgresDocumentStore {
    async fn insert(&self, collection: Collection, document: Value) -> Result<Value, StorageError> {
        let Value::Object(mut fields) = document else {
            return Err(StorageError::InvalidDocument {
                collection: collection.to_string(),
                reason: "document must be a JSON object".to_string(),
            });
        };
        let id = match fields.get("_id").and_then(Value::as_str) {
            Some(id) => id.to_string(),
            None => {
                let id = Uuid::new_v4().to_string();
                fields.insert("_id".to_string(), Value::String(id.clone()));
                id
            }
        };
        let document = Value::Object(fields);

        sqlx::query("INSERT INTO documents (collection, id, data) VALUES ($1, $2, $3)")
            .bind(collection.as_str())
            .bind(&id)
            .bind(&document)
            .execute(&self.pool)
            .await?;

        Ok(document)
    }

    async fn find(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> Result<Vec<Value>, StorageError> {
        let documents = sqlx::query_scalar::<_, Value>(
            r#"
            SELECT data
            FROM documents
            WHERE collection = $1 AND data @> $2
            ORDER BY seq
            "#,
        )
        .bind(collection.as_str())
        .bind(filter.to_containment())
        .fetch_all(&self.pool)
        .await?;

        Ok(documents)
    }

    async fn find_one(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> Result<Option<Value>, StorageError> {
        let document = sqlx::query_scalar::<_, Value>(
            r#"
            SELECT data
            FROM documents
            WHERE collection = $1 AND data @> $2
            ORDER BY seq
            LIMIT 1
            "#,
        )
        .bind(collection.as_str())
        .bind(filter.to_containment())
        .fetch_optional(&self.pool)
        .await?;

        Ok(document)
    }

    async fn delete(&self, collection: Collection, filter: &Filter) -> Result<bool, StorageError> {
        let result = sqlx::query(
            r#"
            DELETE FROM documents
            WHERE (collection, id) IN (
                SELECT collection, id
                FROM documents
                WHERE collection = $1 AND data @> $2
                ORDER BY seq
                LIMIT 1
            )
            "#,
        )
        .bind(collection.as_str())
        .bind(filter.to_containment())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn update(
        &self,
        collection: Collection,
        id: Uuid,
        fields: Map<String, Value>,
    ) -> Result<Option<Value>, StorageError> {
        let document = sqlx::query_scalar::<_, Value>(
            r#"
            UPDATE documents
            SET data = data || $3
            WHERE collection = $1 AND id = $2 AND (data || $3) <> data
            RETURNING data
            "#,
        )
        .bind(collection.as_str())
        .bind(id.to_string())
        .bind(Value::Object(fields))
        .fetch_optional(&self.pool)
        .await?;

        Ok(document)
    }

    async fn push(
        &self,
        collection: Collection,
        id: Uuid,
        field: &str,
        item: Value,
    ) -> Result<bool, StorageError> {
        let result = sqlx::query(
            r#"
            UPDATE documents
            SET data = jsonb_set(
                data,
                ARRAY[$3::text],
                COALESCE(data -> $3, '[]'::jsonb) || jsonb_build_array($4::jsonb)
            )
            WHERE collection = $1 AND id = $2
            "#,
        )
        .bind(collection.as_str())
        .bind(id.to_string())
        .bind(field)
        .bind(item)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn pull(
        &self,
        collection: Collection,
        id: Uuid,
        field: &str,
        matcher: &PullMatcher,
    ) -> Result<bool, StorageError> {
        let result = sqlx::query(
            r#"
            UPDATE documents
            SET data = jsonb_set(
                data,
                ARRAY[$3::text],
                COALESCE((
                    SELECT jsonb_agg(item ORDER BY position)
                    FROM jsonb_array_elements(data -> $3) WITH ORDINALITY AS elements(item, position)
                    WHERE NOT (item @> $4::jsonb)
                ), '[]'::jsonb)
            )
            WHERE collection = $1 AND id = $2
              AND EXISTS (
                SELECT 1
                FROM jsonb_array_elements(data -> $3) AS elements(item)
                WHERE item @> $4::jsonb
              )
            "#,
        )
        .bind(collection.as_str())
        .bind(id.to_string())
        .bind(field)
        .bind(matcher.to_containment())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn update_in_list(
        &self,
        collection: Collection,
        id: Uuid,
        field: &str,
        item_id: Uuid,
        item: Value,
    ) -> Result<bool, StorageError> {
        let result = sqlx::query(
            r#"
            UPDATE documents
            SET data = jsonb_set(
                data,
                ARRAY[$3::text],
                (
                    SELECT jsonb_agg(
                        CASE WHEN item ->> '_id' = $4 THEN $5::jsonb ELSE item END
                        ORDER BY position
                    )
                    FROM jsonb_array_elements(data -> $3) WITH ORDINALITY AS elements(item, position)
                )
            )
            WHERE collection = $1 AND id = $2
              AND EXISTS (
                SELECT 1
                FROM jsonb_array_elements(data -> $3) AS elements(item)
                WHERE item ->> '_id' = $4 AND item <> $5::jsonb
              )
            "#,
        )
        .bind(collection.as_str())
        .bind(id.to_string())
        .bind(field)
        .bind(item_id.to_string())
        .bind(item)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
