//! JSON 요청 본문 검증 middleware.
//!
//! 라우트 등록 시 필수 필드 목록과 함께 적용합니다:
//!
//! ```ignore
//! post(create_stock).route_layer(middleware::from_fn_with_state(
//!     RequiredFields(&["stock_code", "stock_name"]),
//!     validate_json,
//! ))
//! ```
//!
//! 본문/경로/쿼리 extractor([`JsonBody`], [`ApiPath`], [`ApiQuery`])는 거부 시
//! axum 기본 텍스트 대신 `{"error": ...}` 400을 돌려줍니다.

use axum::{
    body::Body,
    extract::{FromRequest, FromRequestParts, Request, State},
    http::header::CONTENT_TYPE,
    middleware::Next,
    response::Response,
    Json,
};
use serde::de::DeserializeOwned;
use stock_core::{StockError, StockResult};

use crate::error::ApiError;

/// 버퍼링할 최대 본문 크기 (axum `Json` 기본 제한과 동일)
const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// 라우트별 필수 필드 목록.
#[derive(Debug, Clone, Copy)]
pub struct RequiredFields(pub &'static [&'static str]);

/// Content-Type, JSON 형식, 필수 필드를 검사합니다.
///
/// 통과하면 버퍼링한 본문을 복원해 핸들러를 그대로 실행합니다.
pub async fn validate_json(
    State(RequiredFields(required)): State<RequiredFields>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let (parts, body) = request.into_parts();

    let content_type = parts
        .headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok());
    if !is_json_content_type(content_type) {
        return Err(content_type_error().into());
    }

    let bytes = axum::body::to_bytes(body, MAX_BODY_BYTES)
        .await
        .map_err(|_| invalid_json_error())?;

    check_required_fields(content_type, &bytes, required)?;

    let request = Request::from_parts(parts, Body::from(bytes));
    Ok(next.run(request).await)
}

/// 요청 검증 규칙.
///
/// - Content-Type이 `application/json`(또는 `+json`)이 아니면 거부
/// - 본문이 JSON 객체가 아니면 `"Invalid JSON data"`
/// - 빠진 필드는 선언 순서대로 `"Missing required fields: a, b"`
pub fn check_required_fields(
    content_type: Option<&str>,
    body: &[u8],
    required: &[&str],
) -> StockResult<()> {
    if !is_json_content_type(content_type) {
        return Err(content_type_error());
    }

    let value: serde_json::Value =
        serde_json::from_slice(body).map_err(|_| invalid_json_error())?;
    let object = value.as_object().ok_or_else(invalid_json_error)?;

    let missing: Vec<&str> = required
        .iter()
        .copied()
        .filter(|field| !object.contains_key(*field))
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(StockError::validation(format!(
            "Missing required fields: {}",
            missing.join(", ")
        )))
    }
}

fn is_json_content_type(content_type: Option<&str>) -> bool {
    let Some(content_type) = content_type else {
        return false;
    };
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    mime == "application/json" || (mime.starts_with("application/") && mime.ends_with("+json"))
}

fn content_type_error() -> StockError {
    StockError::validation("Content-Type must be application/json")
}

fn invalid_json_error() -> StockError {
    StockError::validation("Invalid JSON data")
}

/// 역직렬화 실패를 400 검증 에러로 돌려주는 JSON extractor.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonBody<T>(pub T);

impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(ApiError::validation(rejection.body_text())),
        }
    }
}

/// 파싱 실패를 `{"error": ...}` 400으로 돌려주는 `Path` extractor.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);

/// 파싱 실패를 `{"error": ...}` 400으로 돌려주는 `Query` extractor.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Bytes,
        http::{Request, StatusCode},
        middleware,
        routing::post,
        Router,
    };
    use serde_json::json;
    use tower::ServiceExt;

    const REQUIRED: &[&str] = &["stock_code", "stock_name"];

    fn json_bytes(value: serde_json::Value) -> Bytes {
        Bytes::from(value.to_string())
    }

    #[test]
    fn test_accepts_complete_object() {
        let body = json_bytes(json!({"stock_code": "005930", "stock_name": "삼성전자"}));
        assert!(check_required_fields(Some("application/json"), &body, REQUIRED).is_ok());
        assert!(
            check_required_fields(Some("application/json; charset=utf-8"), &body, REQUIRED).is_ok()
        );
    }

    #[test]
    fn test_rejects_wrong_content_type() {
        let body = json_bytes(json!({}));
        for ct in [None, Some("text/plain"), Some("application/x-www-form-urlencoded")] {
            let err = check_required_fields(ct, &body, REQUIRED).unwrap_err();
            assert_eq!(err.message(), "Content-Type must be application/json");
        }
    }

    #[test]
    fn test_rejects_non_object_bodies() {
        for body in [&b"not json"[..], b"null", b"[1, 2]", b""] {
            let err = check_required_fields(Some("application/json"), body, REQUIRED).unwrap_err();
            assert_eq!(err, StockError::validation("Invalid JSON data"));
        }
    }

    #[test]
    fn test_lists_missing_fields_in_declared_order() {
        let err = check_required_fields(Some("application/json"), b"{}", REQUIRED).unwrap_err();
        assert_eq!(err.message(), "Missing required fields: stock_code, stock_name");

        // null 값은 존재하는 필드로 취급
        let body = json_bytes(json!({"stock_code": null}));
        let err = check_required_fields(Some("application/json"), &body, REQUIRED).unwrap_err();
        assert_eq!(err.message(), "Missing required fields: stock_name");
    }

    fn app() -> Router {
        Router::new().route(
            "/stocks",
            post(|body: Bytes| async move { body }).route_layer(middleware::from_fn_with_state(
                RequiredFields(REQUIRED),
                validate_json,
            )),
        )
    }

    #[tokio::test]
    async fn test_middleware_restores_body() {
        let payload = r#"{"stock_code":"005930","stock_name":"삼성전자"}"#;
        let response = app()
            .oneshot(
                Request::post("/stocks")
                    .header(CONTENT_TYPE, "application/json")
                    .body(Body::from(payload))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], payload.as_bytes());
    }

    #[tokio::test]
    async fn test_middleware_rejects_missing_fields() {
        let response = app()
            .oneshot(
                Request::post("/stocks")
                    .header(CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"stock_code":"005930"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "Missing required fields: stock_name");
    }

    #[tokio::test]
    async fn test_json_body_maps_type_errors_to_400() {
        #[derive(serde::Deserialize)]
        struct Input {
            #[allow(dead_code)]
            count: i64,
        }

        let app = Router::new().route("/", post(|JsonBody(_): JsonBody<Input>| async { "OK" }));
        let response = app
            .oneshot(
                Request::post("/")
                    .header(CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"count":"many"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
