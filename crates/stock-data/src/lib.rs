//! 데이터 저장 및 수집.
//!
//! 이 crate는 다음을 제공합니다:
//! - SQLite 연결 풀과 트랜잭션 경계
//! - 종목/거래 기록/변경 이력/시스템 로그 저장소
//! - 변경 이력을 함께 기록하는 서비스 계층
//! - 네이버 금융 일별 데이터 수집
//! - 빠진 거래일만 채우는 증분 동기화

pub mod calendar;
pub mod db;
pub mod provider;
pub mod repository;
pub mod services;
pub mod sync;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use calendar::{lookback_window, today_kst, TradingCalendar, WeekdayCalendar};
pub use db::{transactional, Database};
pub use provider::{NaverError, NaverFinanceSource, TradingDataSource};
pub use services::{HistoryService, Mutation, StockService, StoreSummary, TradingService};
pub use sync::{
    MissingDatesReport, Reconciler, StockOutcome, StockSyncDetail, SyncOptions, SyncReport,
    SyncTarget, DAYS_BACK_RANGE, MAX_PAGES_RANGE,
};
