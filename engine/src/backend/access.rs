//! Access (ODBC) backend adapter.
//!
//! Access files are served through the system ODBC driver manager via
//! `odbc-api`. ODBC connections are not safe for concurrent statement
//! execution, so the handle lives behind a mutex and every driver call runs
//! on the blocking pool. Table and column discovery use the driver-level
//! catalog functions with layered query fallbacks; pagination uses the TOP
//! rewrite / cursor-skip scheme from [`super::access_sql`].

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, OnceLock};
use std::time::Duration;

use common::errors::{AppError, AppResult};
use common::models::ColumnDescriptor;
use odbc_api::parameter::InputParameter;
use odbc_api::{
    Connection, ConnectionOptions, Cursor, CursorRow, Environment, IntoParameter,
    ResultSetMetadata,
};

use super::access_sql;
use super::{BackendKind, CellValue, SqlRow, TableBackend};
use crate::query::quote_ident;

/// Reserved prefix of Access system tables, excluded at every discovery stage.
const SYSTEM_TABLE_PREFIX: &str = "MSys";

/// The ODBC environment is process-wide and must outlive every connection.
static ODBC_ENV: OnceLock<Environment> = OnceLock::new();

fn environment() -> AppResult<&'static Environment> {
    if ODBC_ENV.get().is_none() {
        let env = Environment::new().map_err(|e| AppError::ConnectionFailed(e.to_string()))?;
        let _ = ODBC_ENV.set(env);
    }
    ODBC_ENV
        .get()
        .ok_or_else(|| AppError::Internal("ODBC environment unavailable".to_string()))
}

fn connection_string(path: &Path) -> String {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    let driver = if ext == "accdb" {
        "Microsoft Access Driver (*.mdb, *.accdb)"
    } else {
        "Microsoft Access Driver (*.mdb)"
    };
    format!(
        "Driver={{{driver}}};Dbq={};ExtendedAnsiSQL=1;",
        path.display()
    )
}

/// Connection to one Access database file.
pub struct AccessBackend {
    conn: Arc<Mutex<Option<Connection<'static>>>>,
    closed: Arc<AtomicBool>,
}

impl AccessBackend {
    /// Connects through the ODBC driver manager. `timeout` becomes the
    /// driver login timeout and bounds establishment only.
    pub async fn connect(path: &Path, timeout: Duration) -> AppResult<Self> {
        let conn_str = connection_string(path);
        let login_timeout = timeout.as_secs() as u32;
        let display = path.display().to_string();

        let conn = tokio::task::spawn_blocking(move || -> AppResult<Connection<'static>> {
            let env = environment()?;
            let mut options = ConnectionOptions::default();
            options.login_timeout_sec = Some(login_timeout);
            env.connect_with_connection_string(&conn_str, options)
                .map_err(|e| AppError::ConnectionFailed(e.to_string()))
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

        tracing::info!(path = %display, "connected to Access database");
        Ok(Self {
            conn: Arc::new(Mutex::new(Some(conn))),
            closed: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Runs a driver call on the blocking pool under the per-handle lock.
    async fn with_conn<T, F>(&self, op: F) -> AppResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection<'static>) -> AppResult<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let guard = conn
                .lock()
                .map_err(|_| AppError::Internal("connection mutex poisoned".to_string()))?;
            match guard.as_ref() {
                Some(conn) => op(conn),
                None => Err(AppError::ConnectionFailed(
                    "connection is closed".to_string(),
                )),
            }
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }
}

#[async_trait::async_trait]
impl TableBackend for AccessBackend {
    async fn ping(&self) -> AppResult<()> {
        self.with_conn(|conn| {
            match conn.is_dead() {
                Ok(false) => Ok(()),
                Ok(true) => Err(AppError::ConnectionFailed(
                    "driver reports connection dead".to_string(),
                )),
                Err(e) => Err(AppError::ConnectionFailed(e.to_string())),
            }
        })
        .await
    }

    async fn list_tables(&self) -> AppResult<Vec<String>> {
        self.with_conn(|conn| {
            let mut tables = match tables_via_catalog(conn) {
                Ok(tables) => tables,
                Err(e) => {
                    tracing::warn!(error = %e, "SQLTables enumeration failed, trying catalog queries");
                    tables_via_fallback_queries(conn)?
                }
            };
            tables.retain(|t| !t.starts_with(SYSTEM_TABLE_PREFIX));
            tables.sort();
            tables.dedup();
            Ok(tables)
        })
        .await
    }

    async fn describe_columns(&self, table: &str) -> AppResult<Vec<ColumnDescriptor>> {
        let table = table.to_string();
        self.with_conn(move |conn| {
            match columns_via_catalog(conn, &table) {
                Ok(columns) if !columns.is_empty() => return Ok(columns),
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(table = %table, error = %e, "SQLColumns failed, probing table");
                }
            }
            match columns_via_probe(conn, &table) {
                Ok(columns) if !columns.is_empty() => Ok(columns),
                Ok(_) | Err(_) => {
                    tracing::warn!(table = %table, "all column introspection fell through, using synthetic column");
                    Ok(vec![ColumnDescriptor::new("Column_1", "Text")])
                }
            }
        })
        .await
    }

    async fn run_query(
        &self,
        sql: &str,
        params: &[String],
        limit: u32,
        offset: u64,
    ) -> AppResult<Vec<SqlRow>> {
        let sql = sql.to_string();
        let params = params.to_vec();
        self.with_conn(move |conn| {
            // First page of a plain SELECT * can ask the driver for TOP n
            // directly; everything else skips rows off the cursor.
            if offset == 0 {
                if let Some(rewritten) = access_sql::rewrite_top(&sql, limit) {
                    return fetch_rows(conn, &rewritten, &params, limit, 0);
                }
            }
            fetch_rows(conn, &sql, &params, limit, offset)
        })
        .await
    }

    async fn run_count(&self, sql: &str, params: &[String]) -> AppResult<i64> {
        let sql = sql.to_string();
        let params = params.to_vec();
        self.with_conn(move |conn| {
            let bound = bind_params(&params);
            let cursor = conn
                .execute(&sql, bound.as_slice(), None)
                .map_err(|e| AppError::QueryFailed(e.to_string()))?;
            let Some(mut cursor) = cursor else {
                return Ok(0);
            };
            let mut buf = Vec::new();
            match cursor
                .next_row()
                .map_err(|e| AppError::QueryFailed(e.to_string()))?
            {
                Some(mut row) => match row.get_text(1, &mut buf) {
                    Ok(true) => String::from_utf8_lossy(&buf)
                        .trim()
                        .parse::<i64>()
                        .map_err(|e| AppError::QueryFailed(e.to_string())),
                    Ok(false) => Ok(0),
                    Err(e) => Err(AppError::QueryFailed(e.to_string())),
                },
                None => Ok(0),
            }
        })
        .await
    }

    async fn close(&self) {
        let conn = Arc::clone(&self.conn);
        let closed = Arc::clone(&self.closed);
        let result = tokio::task::spawn_blocking(move || {
            if let Ok(mut guard) = conn.lock() {
                // dropping the connection disconnects; errors are swallowed
                drop(guard.take());
            }
            closed.store(true, Ordering::SeqCst);
        })
        .await;
        if let Err(e) = result {
            tracing::warn!(error = %e, "closing Access connection failed");
        }
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

fn bind_params(params: &[String]) -> Vec<Box<dyn InputParameter>> {
    params
        .iter()
        .map(|p| Box::new(p.clone().into_parameter()) as Box<dyn InputParameter>)
        .collect()
}

/// Primary table enumeration through the driver catalog (SQLTables).
fn tables_via_catalog(conn: &Connection<'_>) -> Result<Vec<String>, odbc_api::Error> {
    let mut cursor = conn.tables("", "", "", "TABLE")?;
    let mut names = Vec::new();
    let mut buf = Vec::new();
    while let Some(mut row) = cursor.next_row()? {
        buf.clear();
        // TABLE_NAME is ordinal 3; skip rows that fail to decode
        match row.get_text(3, &mut buf) {
            Ok(true) => {
                if let Ok(name) = std::str::from_utf8(&buf) {
                    names.push(name.to_string());
                }
            }
            Ok(false) | Err(_) => continue,
        }
    }
    Ok(names)
}

/// Fallback enumeration: the Jet system catalog, then an
/// information-schema shaped query. First success wins.
fn tables_via_fallback_queries(conn: &Connection<'_>) -> AppResult<Vec<String>> {
    const FALLBACKS: [&str; 2] = [
        "SELECT Name FROM MSysObjects WHERE Type=1 AND Flags=0",
        "SELECT DISTINCT TABLE_NAME FROM INFORMATION_SCHEMA.TABLES WHERE TABLE_TYPE='BASE TABLE'",
    ];

    let mut last_error = None;
    for sql in FALLBACKS {
        match first_column_strings(conn, sql) {
            Ok(names) => return Ok(names),
            Err(e) => {
                tracing::warn!(sql, error = %e, "table discovery fallback failed");
                last_error = Some(e);
            }
        }
    }
    Err(AppError::SchemaUnavailable(
        last_error
            .map(|e| e.to_string())
            .unwrap_or_else(|| "all table discovery methods failed".to_string()),
    ))
}

fn first_column_strings(
    conn: &Connection<'_>,
    sql: &str,
) -> Result<Vec<String>, odbc_api::Error> {
    let cursor = conn.execute(sql, (), None)?;
    let Some(mut cursor) = cursor else {
        return Ok(Vec::new());
    };
    let mut names = Vec::new();
    let mut buf = Vec::new();
    while let Some(mut row) = cursor.next_row()? {
        buf.clear();
        match row.get_text(1, &mut buf) {
            Ok(true) => {
                if let Ok(name) = std::str::from_utf8(&buf) {
                    names.push(name.to_string());
                }
            }
            Ok(false) | Err(_) => continue,
        }
    }
    Ok(names)
}

/// Primary column metadata through the driver catalog (SQLColumns).
fn columns_via_catalog(
    conn: &Connection<'_>,
    table: &str,
) -> Result<Vec<ColumnDescriptor>, odbc_api::Error> {
    let mut cursor = conn.columns("", "", table, "")?;
    let mut columns = Vec::new();
    let mut buf = Vec::new();
    while let Some(mut row) = cursor.next_row()? {
        // COLUMN_NAME ordinal 4, TYPE_NAME 6, COLUMN_SIZE 7
        buf.clear();
        let name = match row.get_text(4, &mut buf) {
            Ok(true) => match std::str::from_utf8(&buf) {
                Ok(name) => name.to_string(),
                Err(_) => format!("Column_{}", columns.len() + 1),
            },
            Ok(false) | Err(_) => format!("Column_{}", columns.len() + 1),
        };

        buf.clear();
        let declared_type = match row.get_text(6, &mut buf) {
            Ok(true) => String::from_utf8_lossy(&buf).into_owned(),
            Ok(false) | Err(_) => "Text".to_string(),
        };

        buf.clear();
        let size = match row.get_text(7, &mut buf) {
            Ok(true) => String::from_utf8_lossy(&buf).trim().parse::<u32>().ok(),
            Ok(false) | Err(_) => None,
        };

        columns.push(ColumnDescriptor {
            name,
            declared_type,
            size,
        });
    }
    Ok(columns)
}

/// Fallback column metadata: derive generically-typed names from the result
/// descriptor of a one-row probe.
fn columns_via_probe(conn: &Connection<'_>, table: &str) -> AppResult<Vec<ColumnDescriptor>> {
    let sql = format!(
        "SELECT TOP 1 * FROM {}",
        quote_ident(BackendKind::Access, table)
    );
    let cursor = conn
        .execute(&sql, (), None)
        .map_err(|e| AppError::SchemaUnavailable(e.to_string()))?;
    let Some(mut cursor) = cursor else {
        return Ok(Vec::new());
    };
    let count = cursor
        .num_result_cols()
        .map_err(|e| AppError::SchemaUnavailable(e.to_string()))?;
    let mut columns = Vec::with_capacity(count.max(0) as usize);
    for i in 1..=count.max(0) as u16 {
        let name = cursor
            .col_name(i)
            .unwrap_or_else(|_| format!("Column_{i}"));
        columns.push(ColumnDescriptor::new(name, "Text"));
    }
    Ok(columns)
}

/// Executes a query and reads `limit` rows after discarding `offset`
/// leading rows in bounded chunks off the cursor.
fn fetch_rows(
    conn: &Connection<'_>,
    sql: &str,
    params: &[String],
    limit: u32,
    offset: u64,
) -> AppResult<Vec<SqlRow>> {
    let bound = bind_params(params);
    let cursor = conn
        .execute(sql, bound.as_slice(), None)
        .map_err(|e| AppError::QueryFailed(e.to_string()))?;
    let Some(mut cursor) = cursor else {
        return Ok(Vec::new());
    };

    let column_count = cursor
        .num_result_cols()
        .map_err(|e| AppError::QueryFailed(e.to_string()))?
        .max(0) as u16;

    let mut remaining = offset;
    while remaining > 0 {
        let chunk = remaining.min(access_sql::SKIP_CHUNK);
        for _ in 0..chunk {
            match cursor
                .next_row()
                .map_err(|e| AppError::QueryFailed(e.to_string()))?
            {
                Some(_) => {}
                None => return Ok(Vec::new()),
            }
        }
        remaining -= chunk;
    }

    let mut rows = Vec::with_capacity(limit as usize);
    let mut buf = Vec::new();
    while rows.len() < limit as usize {
        let Some(mut row) = cursor
            .next_row()
            .map_err(|e| AppError::QueryFailed(e.to_string()))?
        else {
            break;
        };
        let mut cells = Vec::with_capacity(column_count as usize);
        for col in 1..=column_count {
            cells.push(read_cell(&mut row, col, &mut buf));
        }
        rows.push(cells);
    }
    Ok(rows)
}

/// Reads one cell as text, falling back to binary. ODBC converts numeric
/// and temporal values to their text form, which is what the viewer
/// displays anyway.
fn read_cell(row: &mut CursorRow<'_>, col: u16, buf: &mut Vec<u8>) -> CellValue {
    buf.clear();
    match row.get_text(col, buf) {
        Ok(true) => match std::str::from_utf8(buf) {
            Ok(s) => CellValue::Text(s.to_string()),
            Err(_) => CellValue::Blob(buf.clone()),
        },
        Ok(false) => CellValue::Null,
        Err(_) => {
            buf.clear();
            match row.get_binary(col, buf) {
                Ok(true) => CellValue::Blob(buf.clone()),
                _ => CellValue::Null,
            }
        }
    }
}
