//! Dynamic SQL assembly.
//!
//! Table and column names never reach SQL text unquoted, and only after they
//! have been validated against the introspected schema. Search terms travel
//! as bound parameters, never by interpolation.

use common::models::PageRequest;

use crate::backend::BackendKind;

/// Quotes an identifier for the backend's dialect, doubling the closing
/// quote character inside the name.
pub fn quote_ident(kind: BackendKind, name: &str) -> String {
    match kind {
        BackendKind::Sqlite => format!("\"{}\"", name.replace('"', "\"\"")),
        BackendKind::Access => format!("[{}]", name.replace(']', "]]")),
    }
}

/// A SQL statement plus its positional string parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundSql {
    pub sql: String,
    pub params: Vec<String>,
}

/// Builds the page SELECT for a request. `search_columns` and `sort_column`
/// must already be validated against the table's schema.
pub fn build_select(
    kind: BackendKind,
    req: &PageRequest,
    search_columns: &[String],
    sort_column: Option<&str>,
) -> BoundSql {
    let mut sql = format!("SELECT * FROM {}", quote_ident(kind, &req.table));
    let params = push_search_clause(kind, &mut sql, &req.search_term, search_columns);

    if let Some(col) = sort_column {
        sql.push_str(" ORDER BY ");
        sql.push_str(&quote_ident(kind, col));
        sql.push(' ');
        sql.push_str(req.sort_order.as_sql());
    }

    BoundSql { sql, params }
}

/// Builds the matching COUNT(*) statement. Pass an empty `search_columns`
/// slice for the unfiltered total.
pub fn build_count(kind: BackendKind, req: &PageRequest, search_columns: &[String]) -> BoundSql {
    let mut sql = format!("SELECT COUNT(*) FROM {}", quote_ident(kind, &req.table));
    let params = push_search_clause(kind, &mut sql, &req.search_term, search_columns);
    BoundSql { sql, params }
}

/// Appends `WHERE c1 LIKE ? OR c2 LIKE ? ...` and returns one `%term%`
/// parameter per predicate. No-op when the term or the column set is empty.
fn push_search_clause(
    kind: BackendKind,
    sql: &mut String,
    term: &str,
    columns: &[String],
) -> Vec<String> {
    if term.is_empty() || columns.is_empty() {
        return Vec::new();
    }

    sql.push_str(" WHERE ");
    let pattern = format!("%{term}%");
    let mut params = Vec::with_capacity(columns.len());
    for (i, col) in columns.iter().enumerate() {
        if i > 0 {
            sql.push_str(" OR ");
        }
        sql.push_str(&quote_ident(kind, col));
        sql.push_str(" LIKE ?");
        params.push(pattern.clone());
    }
    params
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::models::SortOrder;

    fn req(table: &str, term: &str, order: SortOrder) -> PageRequest {
        let mut req = PageRequest::new(table);
        req.search_term = term.to_string();
        req.sort_order = order;
        req
    }

    #[test]
    fn quoting_doubles_closing_delimiter() {
        assert_eq!(quote_ident(BackendKind::Sqlite, "plain"), "\"plain\"");
        assert_eq!(
            quote_ident(BackendKind::Sqlite, "odd\"name"),
            "\"odd\"\"name\""
        );
        assert_eq!(quote_ident(BackendKind::Access, "plain"), "[plain]");
        assert_eq!(quote_ident(BackendKind::Access, "odd]name"), "[odd]]name]");
    }

    #[test]
    fn select_without_search_or_sort_is_bare() {
        let bound = build_select(
            BackendKind::Sqlite,
            &req("Users", "", SortOrder::Asc),
            &[],
            None,
        );
        assert_eq!(bound.sql, "SELECT * FROM \"Users\"");
        assert!(bound.params.is_empty());
    }

    #[test]
    fn search_builds_or_chain_with_bound_patterns() {
        let cols = vec!["name".to_string(), "email".to_string()];
        let bound = build_select(
            BackendKind::Sqlite,
            &req("Users", "smith", SortOrder::Asc),
            &cols,
            None,
        );
        assert_eq!(
            bound.sql,
            "SELECT * FROM \"Users\" WHERE \"name\" LIKE ? OR \"email\" LIKE ?"
        );
        assert_eq!(bound.params, vec!["%smith%", "%smith%"]);
    }

    #[test]
    fn search_term_is_never_interpolated() {
        let cols = vec!["name".to_string()];
        let bound = build_select(
            BackendKind::Sqlite,
            &req("Users", "x'; DROP TABLE Users;--", SortOrder::Asc),
            &cols,
            None,
        );
        assert!(!bound.sql.contains("DROP"));
        assert_eq!(bound.params, vec!["%x'; DROP TABLE Users;--%"]);
    }

    #[test]
    fn sort_column_is_quoted_with_direction() {
        let bound = build_select(
            BackendKind::Access,
            &req("Orders", "", SortOrder::Desc),
            &[],
            Some("Ship Date"),
        );
        assert_eq!(bound.sql, "SELECT * FROM [Orders] ORDER BY [Ship Date] DESC");
    }

    #[test]
    fn count_carries_search_but_never_order() {
        let cols = vec!["name".to_string()];
        let mut r = req("Users", "smith", SortOrder::Desc);
        r.sort_column = Some("name".to_string());
        let bound = build_count(BackendKind::Sqlite, &r, &cols);
        assert_eq!(
            bound.sql,
            "SELECT COUNT(*) FROM \"Users\" WHERE \"name\" LIKE ?"
        );
        assert!(!bound.sql.contains("ORDER BY"));
    }

    #[test]
    fn empty_search_columns_drop_the_filter() {
        let bound = build_count(
            BackendKind::Sqlite,
            &req("Users", "smith", SortOrder::Asc),
            &[],
        );
        assert_eq!(bound.sql, "SELECT COUNT(*) FROM \"Users\"");
        assert!(bound.params.is_empty());
    }
}
