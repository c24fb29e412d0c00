//! Embedded SQLite backend adapter.
//!
//! Table discovery goes through `sqlite_master`, columns through
//! `PRAGMA table_info`, and pagination through native `LIMIT`/`OFFSET`.
//! The pool holds a single connection, which serializes query execution
//! per handle.

use std::path::Path;
use std::time::Duration;

use common::errors::{AppError, AppResult};
use common::models::ColumnDescriptor;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Column, Executor, Row, SqlitePool, TypeInfo, ValueRef};

use super::{BackendKind, CellValue, SqlRow, TableBackend};
use crate::query::quote_ident;

/// Connection to one SQLite database file.
pub struct SqliteBackend {
    pool: SqlitePool,
}

impl SqliteBackend {
    /// Opens the file read-only. The viewer never mutates databases.
    pub async fn connect(path: &Path, timeout: Duration) -> AppResult<Self> {
        let options = SqliteConnectOptions::new().filename(path).read_only(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .acquire_timeout(timeout)
            .connect_with(options)
            .await
            .map_err(|e| AppError::ConnectionFailed(e.to_string()))?;
        tracing::info!(path = %path.display(), "connected to SQLite database");
        Ok(Self { pool })
    }

    async fn pragma_columns(&self, table: &str) -> AppResult<Vec<ColumnDescriptor>> {
        let sql = format!(
            "PRAGMA table_info({})",
            quote_ident(BackendKind::Sqlite, table)
        );
        let rows = sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::QueryFailed(e.to_string()))?;

        let mut columns = Vec::with_capacity(rows.len());
        for row in &rows {
            let Ok(name) = row.try_get::<String, _>("name") else {
                continue;
            };
            let declared_type = row.try_get::<String, _>("type").unwrap_or_default();
            columns.push(ColumnDescriptor::new(name, declared_type));
        }
        Ok(columns)
    }

    /// Fallback: derive column names (with generic typing) from the result
    /// descriptor of a zero-row probe.
    async fn probe_columns(&self, table: &str) -> AppResult<Vec<ColumnDescriptor>> {
        let sql = format!(
            "SELECT * FROM {} LIMIT 1",
            quote_ident(BackendKind::Sqlite, table)
        );
        let describe = self
            .pool
            .describe(&sql)
            .await
            .map_err(|e| AppError::SchemaUnavailable(e.to_string()))?;
        Ok(describe
            .columns()
            .iter()
            .map(|c| ColumnDescriptor::new(c.name(), "Text"))
            .collect())
    }
}

#[async_trait::async_trait]
impl TableBackend for SqliteBackend {
    async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::ConnectionFailed(e.to_string()))?;
        Ok(())
    }

    async fn list_tables(&self) -> AppResult<Vec<String>> {
        let rows = sqlx::query("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::QueryFailed(e.to_string()))?;

        let mut tables = Vec::with_capacity(rows.len());
        for row in &rows {
            let Ok(name) = row.try_get::<String, _>(0) else {
                continue;
            };
            // sqlite_* are internal bookkeeping tables
            if !name.starts_with("sqlite_") {
                tables.push(name);
            }
        }
        Ok(tables)
    }

    async fn describe_columns(&self, table: &str) -> AppResult<Vec<ColumnDescriptor>> {
        match self.pragma_columns(table).await {
            Ok(columns) if !columns.is_empty() => return Ok(columns),
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(table, error = %e, "PRAGMA table_info failed, probing table");
            }
        }

        match self.probe_columns(table).await {
            Ok(columns) if !columns.is_empty() => Ok(columns),
            Ok(_) | Err(_) => {
                tracing::warn!(table, "all column introspection fell through, using synthetic column");
                Ok(vec![ColumnDescriptor::new("Data", "Text")])
            }
        }
    }

    async fn run_query(
        &self,
        sql: &str,
        params: &[String],
        limit: u32,
        offset: u64,
    ) -> AppResult<Vec<SqlRow>> {
        // limit/offset are engine-computed integers, never caller text
        let paged = format!("{sql} LIMIT {limit} OFFSET {offset}");
        let mut query = sqlx::query(&paged);
        for param in params {
            query = query.bind(param);
        }
        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::QueryFailed(e.to_string()))?;
        Ok(rows.iter().map(decode_row).collect())
    }

    async fn run_count(&self, sql: &str, params: &[String]) -> AppResult<i64> {
        let mut query = sqlx::query_scalar::<_, i64>(sql);
        for param in params {
            query = query.bind(param);
        }
        query
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::QueryFailed(e.to_string()))
    }

    async fn close(&self) {
        self.pool.close().await;
    }

    fn is_closed(&self) -> bool {
        self.pool.is_closed()
    }
}

fn decode_row(row: &SqliteRow) -> SqlRow {
    (0..row.columns().len())
        .map(|idx| decode_cell(row, idx))
        .collect()
}

/// SQLite is dynamically typed, so each cell is routed by the storage class
/// of its actual value, not the column declaration. Decoding never fails a
/// whole row.
fn decode_cell(row: &SqliteRow, idx: usize) -> CellValue {
    let storage = match row.try_get_raw(idx) {
        Ok(raw) if raw.is_null() => return CellValue::Null,
        Ok(raw) => raw.type_info().name().to_ascii_uppercase(),
        Err(_) => return CellValue::Null,
    };

    // Columns declared as dates/times store TEXT or INTEGER; surface them
    // as timestamps when they parse.
    let declared = row.column(idx).type_info().name().to_ascii_uppercase();
    if declared.contains("DATE") || declared.contains("TIME") {
        if let Ok(ts) = row.try_get::<chrono::NaiveDateTime, _>(idx) {
            return CellValue::Timestamp(ts);
        }
    }

    match storage.as_str() {
        "INTEGER" | "BOOLEAN" => {
            if let Ok(v) = row.try_get::<i64, _>(idx) {
                return CellValue::Int(v);
            }
        }
        "REAL" => {
            if let Ok(v) = row.try_get::<f64, _>(idx) {
                return CellValue::Float(v);
            }
        }
        "BLOB" => {
            if let Ok(v) = row.try_get::<Vec<u8>, _>(idx) {
                return CellValue::Blob(v);
            }
        }
        _ => {}
    }

    if let Ok(v) = row.try_get::<String, _>(idx) {
        return CellValue::Text(v);
    }
    if let Ok(v) = row.try_get::<Vec<u8>, _>(idx) {
        return CellValue::Blob(v);
    }

    tracing::debug!(column = idx, storage = %storage, "cell defied every decode, rendering as NULL");
    CellValue::Null
}
