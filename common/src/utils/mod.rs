//! Utility functions and helpers.

pub mod filename;

// Re-export commonly used functions
pub use filename::{allowed_file, display_name, is_safe_component, sanitize_filename};
