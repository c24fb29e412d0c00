//! Shared modules for the database file viewer.
//!
//! Contains configuration loading, the error taxonomy, the API response
//! envelope, HTTP middleware, and the data models exchanged between the
//! query engine and the HTTP layer.

pub mod config;
pub mod errors;
pub mod middleware;
pub mod models;
pub mod response;
pub mod utils;
