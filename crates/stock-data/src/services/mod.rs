//! 서비스 계층.
//!
//! 저장소를 조합해 검증, 트랜잭션, 변경 이력 기록을 처리합니다.
//! 모든 쓰기 작업은 이 계층을 통해서만 이루어집니다.

pub mod history_service;
pub mod stock_service;
pub mod trading_service;

pub use history_service::HistoryService;
pub use stock_service::StockService;
pub use trading_service::{StoreSummary, TradingService};

/// 쓰기 작업 결과.
///
/// 대상 없음과 충돌은 에러가 아닌 결과로 돌려주며, 호출자가 응답 코드를 결정합니다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation<T> {
    Applied(T),
    NotFound(String),
    Conflict(String),
}

impl<T> Mutation<T> {
    pub fn applied(self) -> Option<T> {
        match self {
            Self::Applied(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied(_))
    }
}

/// 이력 테이블에 기록되는 테이블 이름
pub const STOCKS_TABLE: &str = "stocks";
pub const TRADING_TABLE: &str = "stock_trading";
