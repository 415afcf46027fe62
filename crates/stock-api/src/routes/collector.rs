//! 증분 수집 트리거 라우트.
//!
//! `POST /api/v1/collector/incremental`
//!
//! ```json
//! { "stock_code": "005930", "days_back": 30, "max_pages": 5, "force": false, "dry_run": true }
//! ```
//!
//! `stock_code`를 생략하면 전체 종목을 대상으로 합니다.
//! 조회 일수/페이지 범위는 CLI와 같습니다.
//!
//! 수집은 별도 태스크에서 실행되므로 요청이 끊겨도 중단되지 않습니다.
//! 이 라우터에는 요청 타임아웃이 걸리지 않습니다.

use axum::{extract::State, middleware, routing::post, Json, Router};
use serde::Deserialize;
use std::sync::Arc;
use stock_core::StockError;
use stock_data::{today_kst, SyncOptions, SyncReport, SyncTarget};
use tracing::{error, info};

use crate::error::{user_as_not_found, ApiError, ApiResult};
use crate::middleware::{validate_json, JsonBody, RequiredFields};
use crate::state::AppState;

/// 증분 수집 요청
#[derive(Debug, Deserialize)]
pub struct IncrementalRequest {
    #[serde(default)]
    pub stock_code: Option<String>,
    #[serde(default = "default_days_back")]
    pub days_back: i64,
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,
    #[serde(default)]
    pub force: bool,
    #[serde(default)]
    pub dry_run: bool,
}

fn default_days_back() -> i64 {
    SyncOptions::default().days_back
}

fn default_max_pages() -> u32 {
    SyncOptions::default().max_pages
}

impl IncrementalRequest {
    fn target(&self) -> SyncTarget {
        match &self.stock_code {
            Some(code) => SyncTarget::Stock(code.clone()),
            None => SyncTarget::All,
        }
    }

    fn options(&self) -> SyncOptions {
        SyncOptions {
            days_back: self.days_back,
            max_pages: self.max_pages,
            force: self.force,
            dry_run: self.dry_run,
        }
    }
}

/// POST /api/v1/collector/incremental
async fn run_incremental(
    State(state): State<Arc<AppState>>,
    JsonBody(request): JsonBody<IncrementalRequest>,
) -> ApiResult<Json<SyncReport>> {
    let target = request.target();
    info!(?target, dry_run = request.dry_run, "증분 수집 요청");

    let reconciler = state.reconciler.clone();
    let options = request.options();
    let task = tokio::spawn(async move { reconciler.run(&target, &options, today_kst()).await });

    let report = task
        .await
        .map_err(|e| {
            error!(error = %e, "증분 수집 태스크 실패");
            ApiError::from(StockError::data_collection(format!("collector task failed: {}", e)))
        })?
        .map_err(user_as_not_found)?;

    Ok(Json(report))
}

pub fn collector_router() -> Router<Arc<AppState>> {
    Router::new().route(
        "/incremental",
        post(run_incremental).route_layer(middleware::from_fn_with_state(
            RequiredFields(&[]),
            validate_json,
        )),
    )
}
