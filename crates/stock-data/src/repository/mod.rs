//! SQL 접근 계층.
//!
//! 모든 메서드는 쿼리 하나만 실행하며 `Executor`를 받으므로 풀과
//! 트랜잭션 연결 양쪽에서 사용할 수 있습니다.

pub mod history;
pub mod stocks;
pub mod system_logs;
pub mod trading;

pub use history::HistoryRepository;
pub use stocks::StockRepository;
pub use system_logs::SystemLogRepository;
pub use trading::TradingRepository;

/// 목록 조회 기본 건수
pub const DEFAULT_LIMIT: i64 = 100;
/// 목록 조회 최대 건수
pub const MAX_LIMIT: i64 = 1000;

/// 요청된 limit를 `1..=MAX_LIMIT` 범위로 맞춥니다.
pub fn clamp_limit(limit: Option<i64>) -> i64 {
    limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
}
