//! Backend adapters.
//!
//! A [`Backend`] is one live connection to a database file. Exactly two
//! variants exist, selected once at creation time by file extension; every
//! call site depends only on the uniform [`TableBackend`] surface.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use common::errors::{AppError, AppResult};
use common::models::ColumnDescriptor;

pub mod access_sql;
pub mod sqlite;

#[cfg(feature = "odbc")]
pub mod access;

pub use sqlite::SqliteBackend;

#[cfg(feature = "odbc")]
pub use access::AccessBackend;

/// Backend family, determined by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// Embedded SQLite file (`.sqlite`, `.db`).
    Sqlite,
    /// Access file served through an ODBC driver (`.mdb`, `.accdb`).
    Access,
}

impl BackendKind {
    /// Maps a file path to its backend family.
    pub fn from_path(path: &Path) -> AppResult<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match ext.as_str() {
            "sqlite" | "db" => Ok(BackendKind::Sqlite),
            "mdb" | "accdb" => Ok(BackendKind::Access),
            other => Err(AppError::Validation(format!(
                "unsupported database extension: {other:?}"
            ))),
        }
    }
}

/// One value from one result cell, typed at the adapter boundary so the
/// formatter never has to guess.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Null,
    Int(i64),
    Float(f64),
    Text(String),
    Blob(Vec<u8>),
    Timestamp(NaiveDateTime),
}

/// One result row.
pub type SqlRow = Vec<CellValue>;

/// Uniform capability surface over a native connection.
#[async_trait]
pub trait TableBackend: Send + Sync {
    /// Trivial round-trip to verify the connection is still live.
    async fn ping(&self) -> AppResult<()>;

    /// Lists user table names, sorted lexicographically. System/internal
    /// tables are excluded; rows that fail to decode are skipped.
    async fn list_tables(&self) -> AppResult<Vec<String>>;

    /// Describes the columns of a table. Degrades through fallbacks down to
    /// a single synthetic column; never fails once the table is known to
    /// exist.
    async fn describe_columns(&self, table: &str) -> AppResult<Vec<ColumnDescriptor>>;

    /// Executes a parameterized query and returns at most `limit` rows
    /// starting at `offset` in the query's implied ordering.
    async fn run_query(
        &self,
        sql: &str,
        params: &[String],
        limit: u32,
        offset: u64,
    ) -> AppResult<Vec<SqlRow>>;

    /// Executes a count query and returns the single integer result.
    async fn run_count(&self, sql: &str, params: &[String]) -> AppResult<i64>;

    /// Closes the connection. Idempotent.
    async fn close(&self);

    /// Whether the connection has been closed.
    fn is_closed(&self) -> bool;
}

/// A live connection to one database file.
pub enum Backend {
    Sqlite(SqliteBackend),
    #[cfg(feature = "odbc")]
    Access(AccessBackend),
}

impl Backend {
    /// Opens a connection, selecting the variant by file extension.
    /// `timeout` bounds connection establishment only.
    pub async fn connect(path: &Path, timeout: Duration) -> AppResult<Self> {
        match BackendKind::from_path(path)? {
            BackendKind::Sqlite => {
                let backend = SqliteBackend::connect(path, timeout).await?;
                Ok(Backend::Sqlite(backend))
            }
            BackendKind::Access => {
                #[cfg(feature = "odbc")]
                {
                    let backend = AccessBackend::connect(path, timeout).await?;
                    Ok(Backend::Access(backend))
                }
                #[cfg(not(feature = "odbc"))]
                {
                    Err(AppError::ConnectionFailed(
                        "Access databases require the `odbc` feature".to_string(),
                    ))
                }
            }
        }
    }

    /// Backend family of this connection.
    pub fn kind(&self) -> BackendKind {
        match self {
            Backend::Sqlite(_) => BackendKind::Sqlite,
            #[cfg(feature = "odbc")]
            Backend::Access(_) => BackendKind::Access,
        }
    }
}

#[async_trait]
impl TableBackend for Backend {
    async fn ping(&self) -> AppResult<()> {
        match self {
            Backend::Sqlite(b) => b.ping().await,
            #[cfg(feature = "odbc")]
            Backend::Access(b) => b.ping().await,
        }
    }

    async fn list_tables(&self) -> AppResult<Vec<String>> {
        match self {
            Backend::Sqlite(b) => b.list_tables().await,
            #[cfg(feature = "odbc")]
            Backend::Access(b) => b.list_tables().await,
        }
    }

    async fn describe_columns(&self, table: &str) -> AppResult<Vec<ColumnDescriptor>> {
        match self {
            Backend::Sqlite(b) => b.describe_columns(table).await,
            #[cfg(feature = "odbc")]
            Backend::Access(b) => b.describe_columns(table).await,
        }
    }

    async fn run_query(
        &self,
        sql: &str,
        params: &[String],
        limit: u32,
        offset: u64,
    ) -> AppResult<Vec<SqlRow>> {
        match self {
            Backend::Sqlite(b) => b.run_query(sql, params, limit, offset).await,
            #[cfg(feature = "odbc")]
            Backend::Access(b) => b.run_query(sql, params, limit, offset).await,
        }
    }

    async fn run_count(&self, sql: &str, params: &[String]) -> AppResult<i64> {
        match self {
            Backend::Sqlite(b) => b.run_count(sql, params).await,
            #[cfg(feature = "odbc")]
            Backend::Access(b) => b.run_count(sql, params).await,
        }
    }

    async fn close(&self) {
        match self {
            Backend::Sqlite(b) => b.close().await,
            #[cfg(feature = "odbc")]
            Backend::Access(b) => b.close().await,
        }
    }

    fn is_closed(&self) -> bool {
        match self {
            Backend::Sqlite(b) => b.is_closed(),
            #[cfg(feature = "odbc")]
            Backend::Access(b) => b.is_closed(),
        }
    }
}
