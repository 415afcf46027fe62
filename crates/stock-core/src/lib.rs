//! # Stock Core
//!
//! 주식 원장 백엔드의 핵심 도메인 모델 및 공통 인프라를 제공합니다.
//!
//! 이 크레이트는 다른 모든 크레이트에서 사용되는 기본 타입을 제공합니다:
//! - 도메인 에러 분류 ([`StockError`])
//! - 종목, 거래 기록, 변경 이력, 시스템 로그 모델
//! - 환경변수/파일 기반 설정
//! - 로깅 인프라
//! - TTL 기반 메모이제이션 캐시

pub mod cache;
pub mod config;
pub mod domain;
pub mod error;
pub mod logging;

pub use cache::{CacheKey, TtlCache};
pub use config::*;
pub use domain::*;
pub use error::*;
pub use logging::*;
