//! Schema-driven request validation.
//!
//! Everything the SQL builder quotes into a statement comes through here
//! first. Table names are checked against the live table list, and requested
//! search/sort columns are intersected with the introspected schema, so a
//! request can never smuggle an identifier the database does not have.

use common::errors::{AppError, AppResult};
use common::models::{ColumnDescriptor, PageRequest};

use crate::backend::{Backend, TableBackend};

/// Declared-type fragments that mark a column as searchable by default.
const TEXT_TYPE_MARKERS: [&str; 5] = ["CHAR", "TEXT", "MEMO", "CLOB", "STRING"];

/// Confirms the table exists in the database, case-sensitively.
pub async fn validate_table(backend: &Backend, table: &str) -> AppResult<()> {
    let tables = backend.list_tables().await?;
    if tables.iter().any(|t| t == table) {
        Ok(())
    } else {
        Err(AppError::TableNotFound(table.to_string()))
    }
}

/// Whether a declared type denotes textual data.
pub fn is_text_type(declared: &str) -> bool {
    let upper = declared.to_ascii_uppercase();
    TEXT_TYPE_MARKERS.iter().any(|m| upper.contains(m))
}

/// Resolves the columns a search term applies to.
///
/// An explicit request is intersected with the schema and unknown names are
/// dropped. With no explicit request (or the `all` sentinel) the text-typed
/// columns are used; if type information is absent for every column the
/// whole schema is searchable. Can legitimately resolve to empty, which
/// disables filtering.
pub fn resolve_search_columns(req: &PageRequest, columns: &[ColumnDescriptor]) -> Vec<String> {
    if !req.wants_all_columns() {
        return req
            .search_columns
            .iter()
            .filter(|requested| columns.iter().any(|c| &c.name == *requested))
            .cloned()
            .collect();
    }

    if columns.iter().all(|c| c.declared_type.is_empty()) {
        return columns.iter().map(|c| c.name.clone()).collect();
    }

    columns
        .iter()
        .filter(|c| is_text_type(&c.declared_type))
        .map(|c| c.name.clone())
        .collect()
}

/// Resolves the sort column, silently dropping names absent from the
/// schema so a stale sort request degrades to natural order.
pub fn resolve_sort_column<'a>(
    req: &'a PageRequest,
    columns: &[ColumnDescriptor],
) -> Option<&'a str> {
    let requested = req.sort_column.as_deref()?;
    if columns.iter().any(|c| c.name == requested) {
        Some(requested)
    } else {
        tracing::debug!(column = requested, "ignoring unknown sort column");
        None
    }
}
