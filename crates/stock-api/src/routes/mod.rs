//! API 라우트.
//!
//! 모든 REST API 엔드포인트를 정의하고 라우터를 구성합니다.
//!
//! # 라우트 구조
//!
//! - `/health` - 헬스 체크
//! - `/ready` - 준비 상태
//! - `/api/v1/stocks` - 종목 관리
//! - `/api/v1/trading` - 일별 거래 기록
//! - `/api/v1/history` - 변경 이력 / 시스템 로그
//! - `/api/v1/collector` - 증분 수집

pub mod collector;
pub mod health;
pub mod history;
pub mod stocks;
pub mod trading;

pub use collector::{collector_router, IncrementalRequest};
pub use health::{health_router, HealthResponse, ReadyResponse};
pub use history::history_router;
pub use stocks::{stocks_router, ListStocksQuery};
pub use trading::{trading_router, MissingDatesQuery};

use axum::{http::StatusCode, middleware, Router};
use std::sync::Arc;
use std::time::Duration;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::middleware::{handle_panic, log_execution_time};
use crate::state::AppState;

const COLLECTOR_PATH: &str = "/api/v1/collector";

/// 요청 타임아웃 대상 라우트 (수집 트리거 제외).
fn request_routes() -> Router<Arc<AppState>> {
    Router::new()
        .merge(health_router())
        .nest("/api/v1/stocks", stocks_router())
        .nest("/api/v1/trading", trading_router())
        .nest("/api/v1/history", history_router())
}

/// 전체 API 라우터 생성.
pub fn create_api_router() -> Router<Arc<AppState>> {
    request_routes().nest(COLLECTOR_PATH, collector_router())
}

/// 미들웨어까지 적용된 서버 라우터.
///
/// 안쪽부터 타임아웃(수집 라우트 제외), panic 변환, 처리 시간 로그, 접근 로그, CORS 순입니다.
/// 수집 실행은 시작되면 끝까지 진행되어야 하므로 타임아웃을 걸지 않습니다.
pub fn create_router(state: Arc<AppState>, request_timeout: Duration) -> Router {
    request_routes()
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            request_timeout,
        ))
        .nest(COLLECTOR_PATH, collector_router())
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(middleware::from_fn(log_execution_time))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer())
}

/// CORS 레이어 설정.
///
/// `CORS_ORIGINS`(쉼표 구분)가 있으면 해당 origin만 허용하고,
/// 없으면 개발 모드로 보고 모든 origin을 허용합니다.
fn cors_layer() -> CorsLayer {
    let allow_origin = match std::env::var("CORS_ORIGINS") {
        Ok(origins) if !origins.is_empty() => {
            let origins: Vec<_> = origins
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();

            if origins.is_empty() {
                warn!("CORS_ORIGINS is set but contains no valid origins, allowing any");
                AllowOrigin::any()
            } else {
                info!("CORS configured with {} allowed origins", origins.len());
                AllowOrigin::list(origins)
            }
        }
        _ => AllowOrigin::any(),
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::PUT,
            axum::http::Method::DELETE,
            axum::http::Method::OPTIONS,
        ])
        .allow_headers([axum::http::header::CONTENT_TYPE, axum::http::header::ACCEPT])
        .max_age(Duration::from_secs(3600))
}
