//! Database query engine.
//!
//! Provides the core behind the table viewer:
//! - a bounded, LRU-evicting cache of live database connections keyed by
//!   file path ([`cache::ConnectionCache`]);
//! - a uniform adapter over two backend families, embedded SQLite files and
//!   ODBC-driven Access files ([`backend::Backend`]);
//! - schema introspection with layered fallbacks ([`introspect`]);
//! - safe dynamic SQL construction for search/sort/pagination ([`query`]);
//! - display formatting of raw rows ([`format`]);
//! - the paginated table read that ties them together ([`page::query_page`]).
//!
//! The HTTP layer consumes this crate through `ConnectionCache::acquire`,
//! `Backend::list_tables` / `describe_columns`, `page::query_page`, and
//! `ConnectionCache::release_by_path`; paths handed to `acquire` must already
//! be sanitized by the caller.

pub mod backend;
pub mod cache;
pub mod format;
pub mod introspect;
pub mod page;
pub mod query;

pub use backend::{Backend, BackendKind, CellValue, SqlRow, TableBackend};
pub use cache::{ConnectionCache, MAX_CACHE_SIZE};
pub use page::query_page;
