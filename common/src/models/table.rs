//! Table query models.
//!
//! Request/response pair describing one bounded, filtered, sorted slice of a
//! table, plus the column metadata used to validate identifiers before they
//! are ever interpolated into SQL.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Sentinel value in `search_columns` meaning "search every column".
pub const ALL_COLUMNS: &str = "all";

/// Default page size when the caller does not specify one.
pub const DEFAULT_PAGE_SIZE: u32 = 50;

/// Upper bound on the page size; larger requests are clamped, not rejected.
pub const MAX_PAGE_SIZE: u32 = 500;

/// Metadata for one table column.
///
/// Produced by schema introspection and immutable once returned. Query
/// construction validates requested search/sort columns against these
/// descriptors, which is the system's defense against identifier injection.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ColumnDescriptor {
    /// Column name.
    pub name: String,
    /// Declared type as reported by the backend (may be empty).
    #[serde(rename = "type")]
    pub declared_type: String,
    /// Declared size, when the backend reports one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u32>,
}

impl ColumnDescriptor {
    /// Creates a descriptor without size information.
    pub fn new(name: impl Into<String>, declared_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            declared_type: declared_type.into(),
            size: None,
        }
    }
}

/// Sort direction, restricted to exactly two values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    /// Normalizes a caller-supplied value: anything other than a
    /// case-insensitive "desc" sorts ascending.
    pub fn from_param(value: Option<&str>) -> Self {
        match value {
            Some(v) if v.eq_ignore_ascii_case("desc") => SortOrder::Desc,
            _ => SortOrder::Asc,
        }
    }

    /// SQL keyword for this direction.
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

impl std::fmt::Display for SortOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// One bounded, filtered, sorted read of a table.
///
/// Unknown sort/search columns are silently ignored rather than rejected,
/// so a degenerate request still returns a usable page.
#[derive(Debug, Clone)]
pub struct PageRequest {
    /// Table to read. Must pass membership validation before use.
    pub table: String,
    /// Substring to search for; empty disables filtering.
    pub search_term: String,
    /// Columns to search, or the [`ALL_COLUMNS`] sentinel / empty for the
    /// default column set.
    pub search_columns: Vec<String>,
    /// Column to sort by, if any.
    pub sort_column: Option<String>,
    /// Sort direction.
    pub sort_order: SortOrder,
    /// 1-based page number.
    pub page: u32,
    /// Requested page size, clamped to `[1, MAX_PAGE_SIZE]`.
    pub page_size: u32,
}

impl PageRequest {
    /// Creates a request for the first page of a table with defaults.
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            search_term: String::new(),
            search_columns: Vec::new(),
            sort_column: None,
            sort_order: SortOrder::Asc,
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Effective page size after clamping.
    pub fn clamped_page_size(&self) -> u32 {
        self.page_size.clamp(1, MAX_PAGE_SIZE)
    }

    /// Effective 1-based page number.
    pub fn clamped_page(&self) -> u32 {
        self.page.max(1)
    }

    /// Row offset of the first row of this page.
    pub fn offset(&self) -> u64 {
        (self.clamped_page() as u64 - 1) * self.clamped_page_size() as u64
    }

    /// Whether the search-columns list is the "search everything" sentinel.
    pub fn wants_all_columns(&self) -> bool {
        self.search_columns.is_empty()
            || (self.search_columns.len() == 1 && self.search_columns[0] == ALL_COLUMNS)
    }
}

/// One page of table rows, formatted for display.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PageResult {
    /// Column metadata, in table order.
    pub columns: Vec<ColumnDescriptor>,
    /// Display rows, positional per `columns`.
    pub rows: Vec<Vec<String>>,
    /// Total rows in the table, ignoring any search filter.
    pub total_count: i64,
    /// Rows matching the search filter (equals `total_count` without one).
    pub filtered_count: i64,
    /// Page number actually served.
    pub page: u32,
    /// Page size actually used.
    pub page_size: u32,
    /// `ceil(total_count / page_size)`.
    pub total_pages: u32,
}
