//! 헬스 체크 endpoint.
//!
//! 로드밸런서나 오케스트레이션 시스템(Kubernetes 등)에서 사용됩니다.
//! 두 엔드포인트 모두 `SELECT 1`로 저장소를 확인합니다.

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::state::AppState;

/// 헬스 체크 응답 구조체.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// 전체 서비스 상태 ("healthy" | "unhealthy")
    pub status: String,

    /// 데이터베이스 상태 ("healthy" | "unhealthy")
    pub database: String,

    /// 현재 시간 (ISO 8601)
    pub timestamp: String,

    pub version: String,

    /// 서버 업타임(초)
    pub uptime_secs: i64,
}

/// 준비 상태 응답.
#[derive(Debug, Serialize, Deserialize)]
pub struct ReadyResponse {
    /// "ready" | "not ready"
    pub status: String,
}

fn health_label(healthy: bool) -> &'static str {
    if healthy {
        "healthy"
    } else {
        "unhealthy"
    }
}

/// GET /health
pub async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let healthy = state.is_db_healthy().await;

    let response = HealthResponse {
        status: health_label(healthy).to_string(),
        database: health_label(healthy).to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        version: state.version.clone(),
        uptime_secs: state.uptime_secs(),
    };

    let status_code = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(response))
}

/// GET /ready
pub async fn readiness_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    if state.is_db_healthy().await {
        (
            StatusCode::OK,
            Json(ReadyResponse {
                status: "ready".to_string(),
            }),
        )
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ReadyResponse {
                status: "not ready".to_string(),
            }),
        )
    }
}

/// 헬스 체크 라우터 생성.
pub fn health_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
}
