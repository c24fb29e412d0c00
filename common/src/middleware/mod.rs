//! HTTP middleware components.

pub mod auth;
pub mod request_id;

// Re-export commonly used types
pub use auth::{require_admin_token, ADMIN_TOKEN_HEADER};
pub use request_id::{request_id_middleware, RequestId, REQUEST_ID_HEADER};
