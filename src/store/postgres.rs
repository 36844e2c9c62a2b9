use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::{PgArguments, PgPoolOptions};
use sqlx::{Executor, PgPool, Row};
use tracing::{debug, info};

use super::{new_document_id, Collection, Document, DocumentList, DocumentStore, StoreError, SYSTEM_FIELDS};
use crate::config::DatabaseConfig;
use crate::filter::{Filter, FilterData};

const SCHEMA_SQL: &str = include_str!("../../sql/schema.sql");

/// Document store backed by one Postgres table per collection. Rows are
/// returned through `row_to_json` so every collection shares the same code path.
#[derive(Clone)]
pub struct PgDocumentStore {
    pool: PgPool,
    max_limit: Option<i32>,
    log_queries: bool,
}

impl PgDocumentStore {
    pub async fn connect(config: &DatabaseConfig, max_limit: Option<i32>) -> Result<Self, StoreError> {
        let database_url = config
            .url
            .as_deref()
            .ok_or_else(|| StoreError::Connection("DATABASE_URL is not configured".to_string()))?;

        let url = url::Url::parse(database_url)
            .map_err(|_| StoreError::Connection("Invalid DATABASE_URL".to_string()))?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
            .connect(database_url)
            .await?;

        info!(
            "Created database pool for: {}{}",
            url.host_str().unwrap_or("localhost"),
            url.path()
        );
        Ok(Self { pool, max_limit, log_queries: config.enable_query_logging })
    }

    fn log_query(&self, sql: &str, params: usize) {
        if self.log_queries {
            debug!("SQL ({} params): {}", params, sql);
        }
    }

    /// Create the collection tables if they do not exist
    pub async fn apply_schema(&self) -> Result<(), StoreError> {
        self.pool.execute(SCHEMA_SQL).await?;
        info!("Applied document store schema");
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
        info!("Closed database pool");
    }

    fn filter_for(&self, collection: Collection, data: FilterData) -> Result<Filter, StoreError> {
        let mut filter = Filter::new(collection.table_name())?.with_max_limit(self.max_limit);
        filter.assign(data)?;
        Ok(filter)
    }

    fn row_document(row: &sqlx::postgres::PgRow) -> Result<Document, StoreError> {
        match row.try_get::<Value, _>("row")? {
            Value::Object(map) => Ok(map),
            other => Err(StoreError::InvalidQuery(format!("unexpected row format: {}", other))),
        }
    }

    /// Writable fields of `data` in a stable order, skipping store-owned ones
    fn writable_fields(data: Document) -> Result<Vec<(String, Value)>, StoreError> {
        let mut fields = Vec::new();
        for (column, value) in data {
            if SYSTEM_FIELDS.contains(&column.as_str()) {
                continue;
            }
            Filter::validate_column(&column)?;
            fields.push((column, value));
        }
        Ok(fields)
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn list_documents(&self, collection: Collection, filter_data: FilterData) -> Result<DocumentList<Document>, StoreError> {
        let filter = self.filter_for(collection, filter_data)?;

        let select = filter.to_sql()?;
        let sql = format!("SELECT row_to_json(t) AS row FROM ({}) t", select.query);
        self.log_query(&sql, select.params.len());
        let mut q = sqlx::query(&sql);
        for p in select.params.iter() {
            q = bind_param(q, p);
        }
        let rows = q.fetch_all(&self.pool).await?;
        let documents = rows.iter().map(Self::row_document).collect::<Result<Vec<_>, _>>()?;

        let count = filter.to_count_sql()?;
        let mut q = sqlx::query(&count.query);
        for p in count.params.iter() {
            q = bind_param(q, p);
        }
        let total: i64 = q.fetch_one(&self.pool).await?.try_get("count")?;

        Ok(DocumentList { documents, total: total.max(0) as usize })
    }

    async fn get_document(&self, collection: Collection, id: &str) -> Result<Document, StoreError> {
        let sql = format!(
            "SELECT row_to_json(t) AS row FROM \"{}\" t WHERE t.\"id\" = $1",
            collection.table_name()
        );
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::NotFound { collection, id: id.to_string() })?;
        Self::row_document(&row)
    }

    async fn create_document(&self, collection: Collection, data: Document) -> Result<Document, StoreError> {
        // NULLs are left to column defaults; a bare NULL parameter is typed as text
        let fields: Vec<(String, Value)> = Self::writable_fields(data)?
            .into_iter()
            .filter(|(_, v)| !v.is_null())
            .collect();

        let mut columns = vec!["\"id\"".to_string()];
        let mut placeholders = vec!["$1".to_string()];
        for (i, (column, _)) in fields.iter().enumerate() {
            columns.push(format!("\"{}\"", column));
            placeholders.push(format!("${}", i + 2));
        }
        let sql = format!(
            "INSERT INTO \"{}\" AS t ({}) VALUES ({}) RETURNING row_to_json(t) AS row",
            collection.table_name(),
            columns.join(", "),
            placeholders.join(", ")
        );

        self.log_query(&sql, fields.len() + 1);
        let mut q = sqlx::query(&sql).bind(new_document_id());
        for (_, value) in fields.iter() {
            q = bind_param(q, value);
        }
        let row = q.fetch_one(&self.pool).await?;
        Self::row_document(&row)
    }

    async fn update_document(&self, collection: Collection, id: &str, data: Document) -> Result<Document, StoreError> {
        let fields = Self::writable_fields(data)?;

        let mut assignments: Vec<String> = fields
            .iter()
            .enumerate()
            .map(|(i, (column, _))| format!("\"{}\" = ${}", column, i + 1))
            .collect();
        assignments.push("\"updated_at\" = now()".to_string());

        let sql = format!(
            "UPDATE \"{}\" AS t SET {} WHERE t.\"id\" = ${} RETURNING row_to_json(t) AS row",
            collection.table_name(),
            assignments.join(", "),
            fields.len() + 1
        );

        self.log_query(&sql, fields.len() + 1);
        let mut q = sqlx::query(&sql);
        for (_, value) in fields.iter() {
            q = bind_param(q, value);
        }
        let row = q
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::NotFound { collection, id: id.to_string() })?;
        Self::row_document(&row)
    }

    async fn delete_document(&self, collection: Collection, id: &str) -> Result<(), StoreError> {
        let sql = format!("DELETE FROM \"{}\" WHERE \"id\" = $1", collection.table_name());
        let result = sqlx::query(&sql).bind(id).execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound { collection, id: id.to_string() });
        }
        Ok(())
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

fn bind_param<'q>(
    q: sqlx::query::Query<'q, sqlx::Postgres, PgArguments>,
    v: &'q Value,
) -> sqlx::query::Query<'q, sqlx::Postgres, PgArguments> {
    match v {
        Value::Null => {
            let none: Option<String> = None;
            q.bind(none)
        }
        Value::Bool(b) => q.bind(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                q.bind(i)
            } else if let Some(u) = n.as_u64() {
                // Postgres doesn't have u64; cast down if safe
                q.bind(u as i64)
            } else if let Some(f) = n.as_f64() {
                q.bind(f)
            } else {
                q.bind(n.to_string())
            }
        }
        Value::String(s) => q.bind(s),
        // Structured values go in as JSONB
        Value::Array(_) | Value::Object(_) => q.bind(v.clone()),
    }
}
