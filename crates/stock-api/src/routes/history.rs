//! 변경 이력 / 시스템 로그 조회 라우트.
//!
//! - `GET /api/v1/history` - 변경 이력 (`?table_name=&action=&record_id=&limit=`, 최신순)
//! - `GET /api/v1/history/system-logs` - 시스템 로그 (`?category=&level=&limit=`)

use axum::{
    extract::State,
    routing::get,
    Json, Router,
};
use std::sync::Arc;
use stock_core::{DataHistory, HistoryQuery, SystemLog, SystemLogQuery};

use crate::error::ApiResult;
use crate::middleware::ApiQuery;
use crate::state::AppState;

async fn list_history(
    State(state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<HistoryQuery>,
) -> ApiResult<Json<Vec<DataHistory>>> {
    Ok(Json(state.history.list_history(&query).await?))
}

async fn list_system_logs(
    State(state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<SystemLogQuery>,
) -> ApiResult<Json<Vec<SystemLog>>> {
    Ok(Json(state.history.list_system_logs(&query).await?))
}

pub fn history_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_history))
        .route("/system-logs", get(list_system_logs))
}
