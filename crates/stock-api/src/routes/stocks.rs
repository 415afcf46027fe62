//! 종목 API 라우트.
//!
//! # 엔드포인트
//!
//! - `GET /api/v1/stocks` - 종목 목록 (`?market=&limit=&offset=`)
//! - `POST /api/v1/stocks` - 종목 생성
//! - `GET /api/v1/stocks/stats` - 시장별 종목 수 (TTL 캐시)
//! - `GET /api/v1/stocks/{id}` - 종목 조회
//! - `PUT /api/v1/stocks/{id}` - 종목 부분 수정
//! - `DELETE /api/v1/stocks/{id}` - 종목 삭제
//! - `GET /api/v1/stocks/code/{code}` - 종목 코드로 조회

use axum::{
    extract::State,
    http::StatusCode,
    middleware,
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use stock_core::{CacheKey, NewStock, Stock, StockStats, StockUpdate};
use tracing::debug;

use crate::error::{applied, ApiError, ApiResult};
use crate::middleware::{validate_json, ApiPath, ApiQuery, JsonBody, RequiredFields};
use crate::state::AppState;

/// 목록 조회 쿼리
#[derive(Debug, Default, Deserialize)]
pub struct ListStocksQuery {
    pub market: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// GET /api/v1/stocks
async fn list_stocks(
    State(state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<ListStocksQuery>,
) -> ApiResult<Json<Vec<Stock>>> {
    let stocks = state
        .stocks
        .list_stocks(query.market.as_deref(), query.limit, query.offset)
        .await?;
    Ok(Json(stocks))
}

/// POST /api/v1/stocks
async fn create_stock(
    State(state): State<Arc<AppState>>,
    JsonBody(input): JsonBody<NewStock>,
) -> ApiResult<(StatusCode, Json<Stock>)> {
    let stock = applied(state.stocks.create_stock(input).await?)?;
    Ok((StatusCode::CREATED, Json(stock)))
}

/// GET /api/v1/stocks/stats
async fn stock_stats(State(state): State<Arc<AppState>>) -> ApiResult<Json<StockStats>> {
    let key = CacheKey::new("stock_stats");
    let stats = state
        .stats_cache
        .get_or_try_insert_with(key, || {
            debug!("종목 통계 재계산");
            state.stocks.stats()
        })
        .await?;
    Ok(Json(stats))
}

/// GET /api/v1/stocks/{id}
async fn get_stock(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Json<Stock>> {
    state
        .stocks
        .get_stock(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("Stock not found: {}", id)))
}

/// GET /api/v1/stocks/code/{code}
async fn get_stock_by_code(
    State(state): State<Arc<AppState>>,
    ApiPath(code): ApiPath<String>,
) -> ApiResult<Json<Stock>> {
    state
        .stocks
        .get_stock_by_code(&code)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("Stock not found: {}", code)))
}

/// PUT /api/v1/stocks/{id}
async fn update_stock(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<i64>,
    JsonBody(update): JsonBody<StockUpdate>,
) -> ApiResult<Json<Stock>> {
    let stock = applied(state.stocks.update_stock(id, update).await?)?;
    Ok(Json(stock))
}

/// DELETE /api/v1/stocks/{id}
async fn delete_stock(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<StatusCode> {
    if state.stocks.delete_stock(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found(format!("Stock not found: {}", id)))
    }
}

/// 종목 라우터 생성.
pub fn stocks_router() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/",
            get(list_stocks).merge(post(create_stock).route_layer(
                middleware::from_fn_with_state(
                    RequiredFields(&["stock_code", "stock_name"]),
                    validate_json,
                ),
            )),
        )
        .route("/stats", get(stock_stats))
        .route(
            "/{id}",
            get(get_stock)
                .merge(put(update_stock).route_layer(middleware::from_fn_with_state(
                    RequiredFields(&[]),
                    validate_json,
                )))
                .delete(delete_stock),
        )
        .route("/code/{code}", get(get_stock_by_code))
}
