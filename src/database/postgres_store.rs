//! Almacén de documentos sobre PostgreSQL
//!
//! Cada documento vive en la tabla `documents` como JSONB. Los filtros de
//! igualdad se traducen a contención (`data @> $n`), la búsqueda de texto
//! a `data ->> campo ILIKE` y los rangos de fecha a `::timestamptz`.

use async_trait::async_trait;
use serde_json::Value;
use sqlx::{types::Json, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::store::{Bound, Collection, DocumentFilter, DocumentStore};
use crate::utils::errors::AppResult;

pub struct PgDocumentStore {
    pool: PgPool,
}

impl PgDocumentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Escapar comodines de LIKE en el término de búsqueda
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn insert(&self, collection: Collection, id: Uuid, doc: Value) -> AppResult<()> {
        sqlx::query("INSERT INTO documents (collection, id, data) VALUES ($1, $2, $3)")
            .bind(collection.as_str())
            .bind(id)
            .bind(Json(doc))
            .execute(&self.pool)
            .await?;

        log::debug!("📝 Documento insertado en {}: {}", collection, id);
        Ok(())
    }

    async fn find_by_id(&self, collection: Collection, id: Uuid) -> AppResult<Option<Value>> {
        let row: Option<Json<Value>> = sqlx::query_scalar(
            "SELECT data FROM documents WHERE collection = $1 AND id = $2",
        )
        .bind(collection.as_str())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|json| json.0))
    }

    async fn find(&self, collection: Collection, filter: &DocumentFilter) -> AppResult<Vec<Value>> {
        let mut query: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT data FROM documents WHERE collection = ");
        query.push_bind(collection.as_str());

        if !filter.equals.is_empty() {
            query.push(" AND data @> ");
            query.push_bind(Json(Value::Object(filter.equals.clone())));
        }

        if let Some(search) = filter.search.as_ref().filter(|s| !s.fields.is_empty()) {
            let pattern = format!("%{}%", escape_like(&search.term));
            query.push(" AND (");
            for (i, field) in search.fields.iter().enumerate() {
                if i > 0 {
                    query.push(" OR ");
                }
                query.push("data ->> ");
                query.push_bind(*field);
                query.push(" ILIKE ");
                query.push_bind(pattern.clone());
            }
            query.push(")");
        }

        for time_bound in &filter.time_bounds {
            query.push(" AND (data ->> ");
            query.push_bind(time_bound.field);
            query.push(")::timestamptz ");
            query.push(match time_bound.bound {
                Bound::After => "> ",
                Bound::Before => "< ",
            });
            query.push_bind(time_bound.at);
        }

        match filter.order_by_time {
            Some(field) => {
                query.push(" ORDER BY (data ->> ");
                query.push_bind(field);
                query.push(")::timestamptz ASC, created_at DESC");
            }
            None => {
                query.push(" ORDER BY created_at DESC");
            }
        }

        if let Some(limit) = filter.limit {
            query.push(" LIMIT ");
            query.push_bind(limit);
        }
        if let Some(offset) = filter.offset {
            query.push(" OFFSET ");
            query.push_bind(offset);
        }

        let rows: Vec<Json<Value>> = query
            .build_query_scalar::<Json<Value>>()
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(|json| json.0).collect())
    }

    async fn replace(&self, collection: Collection, id: Uuid, doc: Value) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE documents SET data = $3, updated_at = now() WHERE collection = $1 AND id = $2",
        )
        .bind(collection.as_str())
        .bind(id)
        .bind(Json(doc))
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, collection: Collection, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM documents WHERE collection = $1 AND id = $2")
            .bind(collection.as_str())
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
