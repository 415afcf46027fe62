//! 요청 처리 시간 로깅 middleware.

use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
};
use tokio::time::Instant;
use tracing::info;

/// 요청마다 처리 시간을 info 로그로 남깁니다.
///
/// `function`은 매칭된 라우트 템플릿(`/api/v1/stocks/{id}`)이며,
/// 매칭되지 않은 요청은 실제 경로를 사용합니다. 응답은 그대로 전달합니다.
pub async fn log_execution_time(request: Request, next: Next) -> Response {
    let start = Instant::now();

    let method = request.method().clone();
    let function = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_owned())
        .unwrap_or_else(|| request.uri().path().to_owned());

    let response = next.run(request).await;

    let execution_time = start.elapsed().as_secs_f64();
    info!(
        function = %function,
        method = %method,
        status = response.status().as_u16(),
        execution_time,
        "Function executed"
    );

    response
}
