//! One-call page query: validation, SQL assembly, execution, formatting.

use common::errors::AppResult;
use common::models::{PageRequest, PageResult};

use crate::backend::{Backend, TableBackend};
use crate::{format, introspect, query};

/// Runs a full page read against a live backend.
///
/// Validates the table and requested columns against the introspected
/// schema, then issues the page SELECT plus the unfiltered and (when a
/// search is active) filtered COUNT queries, and formats every cell for
/// display.
pub async fn query_page(backend: &Backend, req: &PageRequest) -> AppResult<PageResult> {
    introspect::validate_table(backend, &req.table).await?;
    let columns = backend.describe_columns(&req.table).await?;

    let page_size = req.clamped_page_size();
    let page = req.clamped_page();
    let offset = req.offset();

    let search_columns = if req.search_term.is_empty() {
        Vec::new()
    } else {
        introspect::resolve_search_columns(req, &columns)
    };
    let sort_column = introspect::resolve_sort_column(req, &columns);

    let kind = backend.kind();
    let select = query::build_select(kind, req, &search_columns, sort_column);
    let rows = backend
        .run_query(&select.sql, &select.params, page_size, offset)
        .await?;

    let total = query::build_count(kind, req, &[]);
    let total_count = backend.run_count(&total.sql, &total.params).await?;

    let filtered_count = if search_columns.is_empty() {
        total_count
    } else {
        let filtered = query::build_count(kind, req, &search_columns);
        backend.run_count(&filtered.sql, &filtered.params).await?
    };

    let total_pages = (total_count.max(0) as u64).div_ceil(u64::from(page_size)) as u32;

    let rows = rows
        .iter()
        .map(|row| format::format_row(row, &req.search_term))
        .collect();

    Ok(PageResult {
        columns,
        rows,
        total_count,
        filtered_count,
        page,
        page_size,
        total_pages,
    })
}
