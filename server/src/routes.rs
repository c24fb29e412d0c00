//! 查看器服务路由模块

use axum::routing::{delete, get, post};
use axum::Router;

use crate::handlers;
use crate::state::AppState;

/// 创建数据库查看器路由
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/api/databases",
            get(handlers::list_databases).post(handlers::upload_database),
        )
        .route("/api/databases/{id}", delete(handlers::delete_database))
        .route("/api/databases/{id}/tables", get(handlers::list_tables))
        .route(
            "/api/databases/{id}/tables/{table}",
            get(handlers::view_table),
        )
        .route("/api/cleanup", post(handlers::cleanup))
        .route("/api/health", get(handlers::health_check))
}
