//! Shared data models.

pub mod database;
pub mod table;

// Re-export commonly used types
pub use database::DatabaseItem;
pub use table::{
    ColumnDescriptor, PageRequest, PageResult, SortOrder, ALL_COLUMNS, DEFAULT_PAGE_SIZE,
    MAX_PAGE_SIZE,
};
