//! 거래 기록 API 라우트.
//!
//! # 엔드포인트
//!
//! - `POST /api/v1/trading` - 거래 기록 추가
//! - `GET /api/v1/trading/{stock_code}` - 기간 조회 (`?start_date=&end_date=&limit=`, 최신순)
//! - `GET /api/v1/trading/{stock_code}/latest` - 최신 기록
//! - `GET /api/v1/trading/{stock_code}/missing-dates` - 빠진 거래일 (`?days_back=30`)

use axum::{
    extract::State,
    http::StatusCode,
    middleware,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use stock_core::{NewTradingRecord, TradingQuery, TradingRecord};
use stock_data::{today_kst, MissingDatesReport};

use crate::error::{applied, user_as_not_found, ApiError, ApiResult};
use crate::middleware::{validate_json, ApiPath, ApiQuery, JsonBody, RequiredFields};
use crate::state::AppState;

/// 빠진 거래일 조회 쿼리
#[derive(Debug, Deserialize)]
pub struct MissingDatesQuery {
    #[serde(default = "default_days_back")]
    pub days_back: i64,
}

fn default_days_back() -> i64 {
    30
}

/// POST /api/v1/trading
async fn create_record(
    State(state): State<Arc<AppState>>,
    JsonBody(record): JsonBody<NewTradingRecord>,
) -> ApiResult<(StatusCode, Json<TradingRecord>)> {
    let saved = applied(state.trading.create_record(record).await?)?;
    Ok((StatusCode::CREATED, Json(saved)))
}

/// GET /api/v1/trading/{stock_code}
async fn list_records(
    State(state): State<Arc<AppState>>,
    ApiPath(stock_code): ApiPath<String>,
    ApiQuery(query): ApiQuery<TradingQuery>,
) -> ApiResult<Json<Vec<TradingRecord>>> {
    let records = state.trading.list_records(&stock_code, &query).await?;
    Ok(Json(records))
}

/// GET /api/v1/trading/{stock_code}/latest
async fn latest_record(
    State(state): State<Arc<AppState>>,
    ApiPath(stock_code): ApiPath<String>,
) -> ApiResult<Json<TradingRecord>> {
    state
        .trading
        .latest_record(&stock_code)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("No trading records: {}", stock_code)))
}

/// GET /api/v1/trading/{stock_code}/missing-dates
async fn missing_dates(
    State(state): State<Arc<AppState>>,
    ApiPath(stock_code): ApiPath<String>,
    ApiQuery(query): ApiQuery<MissingDatesQuery>,
) -> ApiResult<Json<MissingDatesReport>> {
    let report = state
        .reconciler
        .check_missing_dates(&stock_code, query.days_back, today_kst())
        .await
        .map_err(user_as_not_found)?;
    Ok(Json(report))
}

/// 거래 기록 라우터 생성.
pub fn trading_router() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/",
            post(create_record).route_layer(middleware::from_fn_with_state(
                RequiredFields(&["stock_code", "trade_date"]),
                validate_json,
            )),
        )
        .route("/{stock_code}", get(list_records))
        .route("/{stock_code}/latest", get(latest_record))
        .route("/{stock_code}/missing-dates", get(missing_dates))
}
