//! SQL shape helpers for the Access dialect.
//!
//! Access SQL has no `OFFSET` clause, so the adapter paginates in two ways:
//! the first page of a plain `SELECT *` query is rewritten to `SELECT TOP n *`
//! (the row limit must sit directly after the select keyword, ahead of any
//! `ORDER BY`), and everything else falls back to skipping leading rows off
//! an unmodified cursor. These helpers are pure so the shape logic stays
//! testable without an ODBC environment.

/// Prefix a query must carry, case-insensitively, to qualify for the
/// TOP rewrite.
const PLAIN_SELECT: &str = "SELECT *";

/// Rows discarded per batch when skipping toward a page on a raw cursor.
pub const SKIP_CHUNK: u64 = 1000;

/// Rewrites a plain `SELECT *` query to request only the top `limit` rows.
///
/// Returns `None` for any other query shape; the caller then uses the
/// generic skip-based path. This is a best-effort optimization, not a
/// contract.
pub fn rewrite_top(sql: &str, limit: u32) -> Option<String> {
    if sql.len() < PLAIN_SELECT.len() {
        return None;
    }
    let (head, rest) = sql.split_at(PLAIN_SELECT.len());
    if !head.eq_ignore_ascii_case(PLAIN_SELECT) {
        return None;
    }
    Some(format!("SELECT TOP {limit} *{rest}"))
}
