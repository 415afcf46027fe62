//! REST API 서버.
//!
//! 이 크레이트는 다음을 제공합니다:
//! - Axum 기반 종목/거래 기록 CRUD API
//! - 변경 이력 및 시스템 로그 조회
//! - 증분 수집 트리거
//! - 헬스 체크 엔드포인트
//!
//! # 모듈 구성
//!
//! - [`state`]: 애플리케이션 공유 상태 (AppState)
//! - [`routes`]: REST API 엔드포인트
//! - [`middleware`]: 처리 시간 로깅, JSON 검증, panic 변환
//! - [`error`]: 에러 → HTTP 응답 변환

pub mod error;
pub mod middleware;
pub mod routes;
pub mod state;

pub use error::{ApiError, ApiResult, ErrorEnvelope};
pub use routes::{create_api_router, create_router};
pub use state::AppState;

#[cfg(any(test, feature = "test-utils"))]
pub use state::create_test_state;
