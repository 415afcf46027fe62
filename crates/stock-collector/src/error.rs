//! 에러 타입 정의.

use stock_core::StockError;
use thiserror::Error;

/// Collector 에러 타입
#[derive(Debug, Error)]
pub enum CollectorError {
    /// 잘못된 CLI 인자 (종료 코드 1)
    #[error("{0}")]
    InvalidArgs(String),

    /// 설정/초기화 에러
    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Stock(#[from] StockError),

    /// 보고서 출력 실패
    #[error("Output error: {0}")]
    Output(#[from] std::io::Error),
}

impl CollectorError {
    pub fn invalid_args(message: impl Into<String>) -> Self {
        Self::InvalidArgs(message.into())
    }
}

/// Result 타입 별칭
pub type Result<T> = std::result::Result<T, CollectorError>;
