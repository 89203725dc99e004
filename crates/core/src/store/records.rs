use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use sqlx::PgPool;

use crate::criteria::{Predicate, Scalar, SqlFilter};

use super::page::Page;

/// A stored entity record. All entity fields live in the JSONB `content`
/// column; `id` is the surrogate key the single-record routes address.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Record {
    pub id: i64,
    pub entity: String,
    pub content: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Record store error types.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("no {entity} record with id {id}")]
    NotFound { entity: String, id: i64 },

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Bind a sequence of coerced filter values onto a sqlx query.
macro_rules! bind_scalars {
    ($query:expr, $binds:expr) => {{
        let mut q = $query;
        for value in $binds.iter().cloned() {
            q = match value {
                Scalar::Int(v) => q.bind(v),
                Scalar::Float(v) => q.bind(v),
                Scalar::Text(v) => q.bind(v),
                Scalar::Bool(v) => q.bind(v),
                Scalar::Date(v) => q.bind(v),
                Scalar::DateTime(v) => q.bind(v),
            };
        }
        q
    }};
}

/// JSONB-backed store for all gateway entities, one table keyed by entity
/// name. Translates compiled predicates into filtered count-then-page
/// queries; the caller owns predicate validation and sort-key validation.
#[derive(Debug, Clone)]
pub struct RecordStore {
    pool: PgPool,
}

impl RecordStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Filtered count, then one page of records.
    pub async fn list(
        &self,
        entity: &str,
        filter: Option<&Predicate>,
        page: &Page,
    ) -> Result<(i64, Vec<Record>), StoreError> {
        let mut where_clause = String::from("entity = $1");
        let mut binds: Vec<Scalar> = Vec::new();

        if let Some(pred) = filter {
            let rendered = SqlFilter::from_predicate(pred, 2);
            where_clause.push_str(" AND (");
            where_clause.push_str(&rendered.clause);
            where_clause.push(')');
            binds = rendered.binds;
        }

        let count_sql = format!("SELECT COUNT(*) FROM records WHERE {where_clause}");
        tracing::debug!(entity, sql = %count_sql, "counting records");
        let total: i64 = bind_scalars!(sqlx::query_scalar(&count_sql).bind(entity), binds)
            .fetch_one(&self.pool)
            .await?;

        let next = 2 + binds.len();
        let select_sql = format!(
            "SELECT id, entity, content, created_at, updated_at \
             FROM records WHERE {where_clause} \
             ORDER BY {} OFFSET ${next} LIMIT ${}",
            order_clause(page),
            next + 1,
        );
        tracing::debug!(entity, sql = %select_sql, "listing records");
        let records = bind_scalars!(sqlx::query_as::<_, Record>(&select_sql).bind(entity), binds)
            .bind(page.offset)
            .bind(page.limit)
            .fetch_all(&self.pool)
            .await?;

        Ok((total, records))
    }

    pub async fn get(&self, entity: &str, id: i64) -> Result<Record, StoreError> {
        sqlx::query_as::<_, Record>(
            "SELECT id, entity, content, created_at, updated_at \
             FROM records WHERE entity = $1 AND id = $2",
        )
        .bind(entity)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::NotFound {
            entity: entity.to_string(),
            id,
        })
    }

    pub async fn insert(&self, entity: &str, content: &Value) -> Result<Record, StoreError> {
        let record = sqlx::query_as::<_, Record>(
            "INSERT INTO records (entity, content) VALUES ($1, $2) \
             RETURNING id, entity, content, created_at, updated_at",
        )
        .bind(entity)
        .bind(content)
        .fetch_one(&self.pool)
        .await?;
        Ok(record)
    }

    /// Merge a JSON patch into one record's content.
    pub async fn update_by_id(
        &self,
        entity: &str,
        id: i64,
        patch: &Value,
    ) -> Result<Record, StoreError> {
        sqlx::query_as::<_, Record>(
            "UPDATE records SET content = content || $3, updated_at = now() \
             WHERE entity = $1 AND id = $2 \
             RETURNING id, entity, content, created_at, updated_at",
        )
        .bind(entity)
        .bind(id)
        .bind(patch)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::NotFound {
            entity: entity.to_string(),
            id,
        })
    }

    /// Merge a JSON patch into every listed record; returns how many rows
    /// were touched.
    pub async fn update_many(
        &self,
        entity: &str,
        ids: &[i64],
        patch: &Value,
    ) -> Result<u64, StoreError> {
        let result = sqlx::query(
            "UPDATE records SET content = content || $3, updated_at = now() \
             WHERE entity = $1 AND id = ANY($2)",
        )
        .bind(entity)
        .bind(ids.to_vec())
        .bind(patch)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn delete_by_id(&self, entity: &str, id: i64) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM records WHERE entity = $1 AND id = $2")
            .bind(entity)
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound {
                entity: entity.to_string(),
                id,
            });
        }
        Ok(())
    }

    pub async fn delete_many(&self, entity: &str, ids: &[i64]) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM records WHERE entity = $1 AND id = ANY($2)")
            .bind(entity)
            .bind(ids.to_vec())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

/// ORDER BY body for a listing. The sort key was validated against the
/// entity schema by the caller; `id` sorts on the surrogate column, and
/// unsorted listings fall back to insertion order so paging is stable.
fn order_clause(page: &Page) -> String {
    match page.sort_by.as_deref() {
        Some("id") => format!("id {}", page.sort_dir.as_sql()),
        Some(key) => format!("content->>'{key}' {}", page.sort_dir.as_sql()),
        None => "id ASC".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::page::SortDir;

    #[test]
    fn order_clause_defaults_to_id() {
        assert_eq!(order_clause(&Page::default()), "id ASC");
    }

    #[test]
    fn order_clause_uses_sort_key_and_direction() {
        let page = Page {
            sort_by: Some("username".into()),
            sort_dir: SortDir::Desc,
            ..Page::default()
        };
        assert_eq!(order_clause(&page), "content->>'username' DESC");
    }

    #[test]
    fn order_clause_sorts_id_on_surrogate_column() {
        let page = Page {
            sort_by: Some("id".into()),
            sort_dir: SortDir::Desc,
            ..Page::default()
        };
        assert_eq!(order_clause(&page), "id DESC");
    }
}
