//! Uploaded database models.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Metadata describing one uploaded database file.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DatabaseItem {
    /// Stored filename, used as the database identifier in URLs.
    pub id: String,
    /// Original filename before the upload timestamp prefix was added.
    pub original_name: String,
    /// Table names discovered in the database.
    pub tables: Vec<String>,
    /// Number of tables.
    pub table_count: usize,
    /// File size in bytes.
    pub file_size: u64,
    /// Last modification time (RFC 3339).
    pub modified_time: String,
}
