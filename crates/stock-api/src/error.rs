//! API 에러 응답.
//!
//! 핸들러는 [`ApiError`]를 반환하고, HTTP 상태 코드로의 변환은 이 모듈에서만 일어납니다.
//!
//! # 응답 형식
//!
//! 도메인 에러([`StockError`])는 평평한 형식을 사용합니다:
//!
//! ```json
//! { "error": "Missing required fields: stock_name" }
//! ```
//!
//! 핸들러가 직접 결정하는 404/409는 구조화된 형식을 사용합니다:
//!
//! ```json
//! { "error": { "message": "Stock not found: 42", "code": 404, "timestamp": "2024-01-01T00:00:00Z" } }
//! ```

use axum::{
    extract::rejection::{PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use stock_core::StockError;
use stock_data::Mutation;
use tracing::{error, warn};

/// 서버 내부 에러 시 클라이언트에 노출되는 메시지
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

/// 구조화된 에러 본문.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub message: String,
    pub code: u16,
    pub timestamp: String,
}

/// 구조화된 에러 응답 (`{"error": {...}}`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub error: ErrorDetail,
}

impl ErrorEnvelope {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            error: ErrorDetail {
                message: message.into(),
                code: status.as_u16(),
                timestamp: chrono::Utc::now().to_rfc3339(),
            },
        }
    }
}

/// 핸들러 에러.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Stock(#[from] StockError),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),
}

impl ApiError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Stock(StockError::validation(message))
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Stock(e) if e.is_client_error() => StatusCode::BAD_REQUEST,
            Self::Stock(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
        }
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::validation(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::validation(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        match self {
            Self::Stock(e) if e.is_client_error() => {
                warn!(error = %e, "Validation error");
                (status, Json(json!({ "error": e.message() }))).into_response()
            }
            Self::Stock(e) => {
                error!(error = %e, kind = e.kind().as_str(), "Unexpected error");
                internal_error_response()
            }
            Self::NotFound(message) | Self::Conflict(message) => {
                (status, Json(ErrorEnvelope::new(status, message))).into_response()
            }
        }
    }
}

/// 500 응답 (`{"error": "Internal server error"}`).
pub fn internal_error_response() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": INTERNAL_ERROR_MESSAGE })),
    )
        .into_response()
}

/// API 핸들러 Result 타입 별칭.
pub type ApiResult<T> = Result<T, ApiError>;

/// 서비스 쓰기 결과를 핸들러 결과로 변환합니다 (대상 없음 404, 충돌 409).
pub fn applied<T>(mutation: Mutation<T>) -> ApiResult<T> {
    match mutation {
        Mutation::Applied(value) => Ok(value),
        Mutation::NotFound(message) => Err(ApiError::NotFound(message)),
        Mutation::Conflict(message) => Err(ApiError::Conflict(message)),
    }
}

/// 존재하지 않는 대상을 가리키는 `User` 에러를 404로 바꿉니다.
pub fn user_as_not_found(err: StockError) -> ApiError {
    match err {
        StockError::User(message) => ApiError::NotFound(message),
        other => ApiError::Stock(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(response: Response) -> serde_json::Value {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn test_validation_is_400_with_message() {
        let response = ApiError::validation("Invalid JSON data").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await, json!({ "error": "Invalid JSON data" }));
    }

    #[tokio::test]
    async fn test_other_kinds_hide_message() {
        for err in [
            StockError::database("disk I/O error"),
            StockError::data_collection("timeout"),
            StockError::trading("bad row"),
            StockError::user("Stock not found: 123456"),
        ] {
            let response = ApiError::from(err).into_response();
            assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
            assert_eq!(body_json(response).await, json!({ "error": INTERNAL_ERROR_MESSAGE }));
        }
    }

    #[tokio::test]
    async fn test_not_found_uses_structured_envelope() {
        let response = ApiError::not_found("Stock not found: 42").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = body_json(response).await;
        assert_eq!(body["error"]["message"], "Stock not found: 42");
        assert_eq!(body["error"]["code"], 404);
        assert!(body["error"]["timestamp"].is_string());
    }

    #[test]
    fn test_conflict_status() {
        assert_eq!(ApiError::conflict("dup").status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_mutation_mapping() {
        assert_eq!(applied(Mutation::Applied(1)).unwrap(), 1);
        assert_eq!(
            applied::<()>(Mutation::NotFound("x".into())).unwrap_err().status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            applied::<()>(Mutation::Conflict("x".into())).unwrap_err().status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            user_as_not_found(StockError::user("Stock not found: 1")).status(),
            StatusCode::NOT_FOUND
        );
    }
}
