//! Handler模块

use axum::extract::{Multipart, Path, Query, State};
use axum::http::HeaderMap;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use common::errors::AppError;
use common::middleware::auth::require_admin_token;
use common::models::{DatabaseItem, PageRequest, PageResult, SortOrder, ALL_COLUMNS};
use common::response::ApiResponse;
use engine::{query_page, TableBackend};

use crate::service::DatabaseStore;
use crate::state::AppState;

/// 列出所有已上传的数据库文件
#[utoipa::path(
    get,
    path = "/api/databases",
    tag = "databases",
    responses(
        (status = 200, description = "数据库列表", body = ApiResponse<Vec<DatabaseItem>>)
    )
)]
pub async fn list_databases(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<DatabaseItem>>>, AppError> {
    let store = DatabaseStore::new(&state.config, state.cache.clone());
    let data = store.list().await?;
    Ok(Json(ApiResponse::ok_with_service(data, &state.config.service)))
}

/// 上传数据库文件（multipart，字段名 file）
#[utoipa::path(
    post,
    path = "/api/databases",
    tag = "databases",
    request_body(content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "上传成功", body = ApiResponse<DatabaseItem>),
        (status = 400, description = "文件类型或内容校验失败")
    )
)]
pub async fn upload_database(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<DatabaseItem>>, AppError> {
    let mut upload: Option<(String, Vec<u8>)> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(e.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let Some(filename) = field.file_name().map(str::to_string) else {
            return Err(AppError::Validation("upload has no filename".to_string()));
        };
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(e.to_string()))?;
        upload = Some((filename, bytes.to_vec()));
        break;
    }

    let Some((filename, bytes)) = upload else {
        return Err(AppError::Validation("missing file field".to_string()));
    };
    if bytes.len() > state.config.max_upload_bytes {
        return Err(AppError::Validation(format!(
            "file exceeds upload limit of {} bytes",
            state.config.max_upload_bytes
        )));
    }

    let store = DatabaseStore::new(&state.config, state.cache.clone());
    let data = store.save_upload(&filename, &bytes).await?;
    Ok(Json(ApiResponse::ok_with_service(data, &state.config.service)))
}

/// 列出数据库中的表
#[utoipa::path(
    get,
    path = "/api/databases/{id}/tables",
    tag = "databases",
    params(
        ("id" = String, Path, description = "数据库文件 ID")
    ),
    responses(
        (status = 200, description = "表名列表", body = ApiResponse<TableList>),
        (status = 404, description = "数据库未找到")
    )
)]
pub async fn list_tables(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<TableList>>, AppError> {
    let store = DatabaseStore::new(&state.config, state.cache.clone());
    let path = store.resolve_id(&id)?;
    let backend = state.cache.acquire(&path).await?;
    let tables = backend.list_tables().await?;
    Ok(Json(ApiResponse::ok_with_service(
        TableList {
            count: tables.len(),
            tables,
        },
        &state.config.service,
    )))
}

/// 分页浏览表数据，支持搜索与排序
#[utoipa::path(
    get,
    path = "/api/databases/{id}/tables/{table}",
    tag = "databases",
    params(
        ("id" = String, Path, description = "数据库文件 ID"),
        ("table" = String, Path, description = "表名"),
        TableQuery
    ),
    responses(
        (status = 200, description = "分页数据", body = ApiResponse<PageResult>),
        (status = 404, description = "数据库或表未找到")
    )
)]
pub async fn view_table(
    State(state): State<AppState>,
    Path((id, table)): Path<(String, String)>,
    Query(params): Query<TableQuery>,
) -> Result<Json<ApiResponse<PageResult>>, AppError> {
    let store = DatabaseStore::new(&state.config, state.cache.clone());
    let path = store.resolve_id(&id)?;
    let backend = state.cache.acquire(&path).await?;
    let req = params.into_request(table);
    let data = query_page(backend.as_ref(), &req).await?;
    Ok(Json(ApiResponse::ok_with_service(data, &state.config.service)))
}

/// 删除数据库文件（需要管理员令牌）
#[utoipa::path(
    delete,
    path = "/api/databases/{id}",
    tag = "admin",
    params(
        ("id" = String, Path, description = "数据库文件 ID")
    ),
    responses(
        (status = 200, description = "已删除", body = ApiResponse<bool>),
        (status = 403, description = "令牌缺失或不匹配"),
        (status = 404, description = "数据库未找到"),
        (status = 501, description = "未配置管理员令牌")
    )
)]
pub async fn delete_database(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<ApiResponse<bool>>, AppError> {
    require_admin_token(&headers, state.config.admin_token.as_deref())?;
    let store = DatabaseStore::new(&state.config, state.cache.clone());
    store.delete(&id).await?;
    Ok(Json(ApiResponse::ok_with_service(true, &state.config.service)))
}

/// 清空上传目录（需要管理员令牌）
#[utoipa::path(
    post,
    path = "/api/cleanup",
    tag = "admin",
    responses(
        (status = 200, description = "清理完成", body = ApiResponse<CleanupResult>),
        (status = 403, description = "令牌缺失或不匹配"),
        (status = 501, description = "未配置管理员令牌")
    )
)]
pub async fn cleanup(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ApiResponse<CleanupResult>>, AppError> {
    require_admin_token(&headers, state.config.admin_token.as_deref())?;
    let store = DatabaseStore::new(&state.config, state.cache.clone());
    let removed = store.cleanup_all().await?;
    Ok(Json(ApiResponse::ok_with_service(
        CleanupResult { removed },
        &state.config.service,
    )))
}

/// 健康检查端点
#[utoipa::path(
    get,
    path = "/api/health",
    tag = "health",
    responses(
        (status = 200, description = "服务运行正常", body = HealthResponse)
    )
)]
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: state.config.service.clone(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now(),
        connections: state.cache.len().await,
    })
}

/// 表浏览查询参数
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct TableQuery {
    /// 页码（从 1 开始）
    pub page: Option<u32>,
    /// 每页行数（1..=500）
    pub per_page: Option<u32>,
    /// 排序列名
    pub sort_column: Option<String>,
    /// 排序方向：asc 或 desc
    pub sort_order: Option<String>,
    /// 搜索关键字
    pub search: Option<String>,
    /// 逗号分隔的搜索列，或 all
    pub search_columns: Option<String>,
}

impl TableQuery {
    /// Converts the raw query string into an engine page request.
    pub fn into_request(self, table: String) -> PageRequest {
        let mut req = PageRequest::new(table);
        if let Some(page) = self.page {
            req.page = page;
        }
        if let Some(per_page) = self.per_page {
            req.page_size = per_page;
        }
        req.sort_column = self.sort_column.filter(|c| !c.is_empty());
        req.sort_order = SortOrder::from_param(self.sort_order.as_deref());
        req.search_term = self.search.unwrap_or_default();
        req.search_columns = self
            .search_columns
            .as_deref()
            .unwrap_or(ALL_COLUMNS)
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        req
    }
}

/// 表名列表响应
#[derive(Serialize, ToSchema)]
pub struct TableList {
    /// 表名
    pub tables: Vec<String>,
    /// 表数量
    pub count: usize,
}

/// 清理结果
#[derive(Serialize, ToSchema)]
pub struct CleanupResult {
    /// 删除的文件数
    pub removed: usize,
}

/// 健康检查响应
#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    /// 服务状态
    pub status: String,
    /// 服务名称
    pub service: String,
    /// 服务版本
    pub version: String,
    /// 当前时间戳
    pub timestamp: DateTime<Utc>,
    /// 缓存的连接数
    pub connections: usize,
}
