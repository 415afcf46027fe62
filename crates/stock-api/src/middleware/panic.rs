//! 핸들러 panic을 500 응답으로 변환합니다.

use axum::response::Response;
use std::any::Any;
use tracing::error;

use crate::error::internal_error_response;

/// `CatchPanicLayer::custom`에 넘기는 핸들러.
pub fn handle_panic(payload: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else {
        "unknown panic payload".to_string()
    };

    error!(panic = %detail, "Handler panicked");
    internal_error_response()
}
