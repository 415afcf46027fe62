//! 거래 데이터 증분 동기화.
//!
//! 종목별로 조회 구간의 후보 거래일과 저장된 날짜를 비교해 빠진 날짜를 찾고,
//! 빠진 날짜가 있을 때(또는 `force`일 때)만 외부 소스에서 수집합니다.
//!
//! # 동작 방식
//!
//! 1. 대상 종목 결정 (단일 코드 또는 전체, 코드 순)
//! 2. 구간 `[today - (days_back - 1), today]`의 후보 거래일 계산
//! 3. 빠진 날짜 = 후보 거래일 - 저장된 날짜
//! 4. 수집 → 구간 필터 → (force가 아니면) 빠진 날짜만 저장
//! 5. 종목별 결과 집계, 실행 결과를 시스템 로그에 기록
//!
//! 한 종목의 실패는 `failed`로 기록되고 나머지 종목 처리는 계속됩니다.
//! dry-run은 외부 소스 호출과 모든 쓰기를 건너뜁니다.

use crate::calendar::{lookback_window, TradingCalendar, WeekdayCalendar};
use crate::db::Database;
use crate::provider::TradingDataSource;
use crate::services::{HistoryService, StockService, TradingService};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::Arc;
use stock_core::{
    stock_span, timed, validate_stock_code, LogCategory, LogLevel, NewSystemLog, Stock,
    StockError, StockResult,
};
use tracing::{error, info, warn, Instrument};

/// 조회 일수 범위
pub const DAYS_BACK_RANGE: std::ops::RangeInclusive<i64> = 1..=365;
/// 최대 페이지 범위
pub const MAX_PAGES_RANGE: std::ops::RangeInclusive<u32> = 1..=50;

/// 동기화 대상.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncTarget {
    Stock(String),
    All,
}

/// 동기화 옵션.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOptions {
    pub days_back: i64,
    pub max_pages: u32,
    /// 빠진 날짜가 없어도 수집하고 기존 행을 덮어씀
    pub force: bool,
    /// 수집/쓰기 없이 계획만 보고
    pub dry_run: bool,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            days_back: 30,
            max_pages: 5,
            force: false,
            dry_run: false,
        }
    }
}

impl SyncOptions {
    pub fn validate(&self) -> StockResult<()> {
        if !DAYS_BACK_RANGE.contains(&self.days_back) {
            return Err(StockError::validation(format!(
                "days_back must be between 1 and 365, got {}",
                self.days_back
            )));
        }
        if !MAX_PAGES_RANGE.contains(&self.max_pages) {
            return Err(StockError::validation(format!(
                "max_pages must be between 1 and 50, got {}",
                self.max_pages
            )));
        }
        Ok(())
    }
}

/// 종목별 처리 결과.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StockOutcome {
    Collected {
        missing_dates: usize,
        collected_dates: usize,
    },
    Skipped {
        reason: String,
    },
    Failed {
        reason: String,
    },
    /// dry-run 전용
    Planned {
        missing_dates: Vec<NaiveDate>,
    },
}

/// 종목별 상세.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StockSyncDetail {
    pub stock_code: String,
    pub stock_name: String,
    pub latest_date: Option<NaiveDate>,
    pub missing_count: usize,
    #[serde(flatten)]
    pub outcome: StockOutcome,
}

/// 실행 결과 집계.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyncReport {
    pub dry_run: bool,
    pub force: bool,
    pub days_back: i64,
    pub window_start: NaiveDate,
    pub window_end: NaiveDate,
    pub total_stocks: usize,
    pub collected_stocks: usize,
    pub skipped_stocks: usize,
    pub failed_stocks: usize,
    pub planned_stocks: usize,
    pub total_missing_dates: usize,
    pub collected_dates: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub details: Vec<StockSyncDetail>,
}

impl SyncReport {
    fn new(options: &SyncOptions, window: (NaiveDate, NaiveDate)) -> Self {
        let now = Utc::now();
        Self {
            dry_run: options.dry_run,
            force: options.force,
            days_back: options.days_back,
            window_start: window.0,
            window_end: window.1,
            total_stocks: 0,
            collected_stocks: 0,
            skipped_stocks: 0,
            failed_stocks: 0,
            planned_stocks: 0,
            total_missing_dates: 0,
            collected_dates: 0,
            started_at: now,
            finished_at: now,
            details: Vec::new(),
        }
    }

    fn record(&mut self, detail: StockSyncDetail) {
        self.total_stocks += 1;
        self.total_missing_dates += detail.missing_count;

        match &detail.outcome {
            StockOutcome::Collected {
                collected_dates, ..
            } => {
                self.collected_stocks += 1;
                self.collected_dates += collected_dates;
            }
            StockOutcome::Skipped { .. } => self.skipped_stocks += 1,
            StockOutcome::Failed { .. } => self.failed_stocks += 1,
            StockOutcome::Planned { .. } => self.planned_stocks += 1,
        }

        self.details.push(detail);
    }

    /// 실패한 종목이 없으면 true.
    pub fn is_success(&self) -> bool {
        self.failed_stocks == 0
    }

    pub fn failures(&self) -> impl Iterator<Item = &StockSyncDetail> {
        self.details
            .iter()
            .filter(|d| matches!(d.outcome, StockOutcome::Failed { .. }))
    }

    /// 요약 통계를 로그로 출력
    pub fn log_summary(&self) {
        info!(
            dry_run = self.dry_run,
            total = self.total_stocks,
            collected = self.collected_stocks,
            skipped = self.skipped_stocks,
            failed = self.failed_stocks,
            planned = self.planned_stocks,
            missing_dates = self.total_missing_dates,
            collected_dates = self.collected_dates,
            "증분 동기화 완료"
        );
    }
}

/// 빠진 날짜 조회 결과 (쓰기 없음).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MissingDatesReport {
    pub stock: Stock,
    pub latest_date: Option<NaiveDate>,
    pub window_start: NaiveDate,
    pub window_end: NaiveDate,
    pub candidate_days: usize,
    pub missing_dates: Vec<NaiveDate>,
}

/// 증분 동기화 엔진.
#[derive(Clone)]
pub struct Reconciler {
    stocks: StockService,
    trading: TradingService,
    history: HistoryService,
    source: Arc<dyn TradingDataSource>,
    calendar: Arc<dyn TradingCalendar>,
}

struct Gap {
    latest_date: Option<NaiveDate>,
    missing: Vec<NaiveDate>,
}

impl Reconciler {
    /// 월~금 캘린더로 생성합니다.
    pub fn new(db: Database, source: Arc<dyn TradingDataSource>) -> Self {
        Self {
            stocks: StockService::new(db.clone()),
            trading: TradingService::new(db.clone()),
            history: HistoryService::new(db),
            source,
            calendar: Arc::new(WeekdayCalendar::new()),
        }
    }

    pub fn with_calendar(mut self, calendar: Arc<dyn TradingCalendar>) -> Self {
        self.calendar = calendar;
        self
    }

    /// 단일 종목의 빠진 날짜를 조회합니다. 아무것도 쓰지 않습니다.
    pub async fn check_missing_dates(
        &self,
        stock_code: &str,
        days_back: i64,
        today: NaiveDate,
    ) -> StockResult<MissingDatesReport> {
        SyncOptions {
            days_back,
            ..Default::default()
        }
        .validate()?;

        let stock = self.find_stock(stock_code).await?;
        let window = lookback_window(today, days_back);
        let candidates = self.calendar.trading_days(window.0, window.1);
        let gap = self.find_gap(&stock, window, &candidates).await?;

        Ok(MissingDatesReport {
            stock,
            latest_date: gap.latest_date,
            window_start: window.0,
            window_end: window.1,
            candidate_days: candidates.len(),
            missing_dates: gap.missing,
        })
    }

    /// 대상 종목을 동기화하고 결과를 집계합니다.
    ///
    /// 옵션 검증 실패나 존재하지 않는 종목 코드는 즉시 에러로 반환하며,
    /// 그 외 종목 단위 실패는 보고서의 `failed`로만 기록됩니다.
    pub async fn run(
        &self,
        target: &SyncTarget,
        options: &SyncOptions,
        today: NaiveDate,
    ) -> StockResult<SyncReport> {
        options.validate()?;

        let stocks = match target {
            SyncTarget::Stock(code) => vec![self.find_stock(code).await?],
            SyncTarget::All => self.stocks.all_stocks().await?,
        };

        let window = lookback_window(today, options.days_back);
        let candidates = self.calendar.trading_days(window.0, window.1);

        info!(
            stocks = stocks.len(),
            window_start = %window.0,
            window_end = %window.1,
            candidate_days = candidates.len(),
            force = options.force,
            dry_run = options.dry_run,
            source = self.source.name(),
            "증분 동기화 시작"
        );

        let mut report = SyncReport::new(options, window);

        for stock in &stocks {
            let span = stock_span!("sync_stock", stock.stock_code, options.days_back);
            let detail = timed(
                "sync_stock",
                self.sync_stock(stock, options, window, &candidates)
                    .instrument(span),
            )
            .await;
            report.record(detail);
        }

        report.finished_at = Utc::now();
        report.log_summary();

        if !options.dry_run {
            self.write_run_log(&report).await;
        }

        Ok(report)
    }

    async fn sync_stock(
        &self,
        stock: &Stock,
        options: &SyncOptions,
        window: (NaiveDate, NaiveDate),
        candidates: &[NaiveDate],
    ) -> StockSyncDetail {
        let mut detail = StockSyncDetail {
            stock_code: stock.stock_code.clone(),
            stock_name: stock.stock_name.clone(),
            latest_date: None,
            missing_count: 0,
            outcome: StockOutcome::Skipped {
                reason: "up to date".to_string(),
            },
        };

        let gap = match self.find_gap(stock, window, candidates).await {
            Ok(gap) => gap,
            Err(e) => {
                warn!(error = %e, "빠진 날짜 계산 실패");
                detail.outcome = StockOutcome::Failed {
                    reason: e.to_string(),
                };
                return detail;
            }
        };

        detail.latest_date = gap.latest_date;
        detail.missing_count = gap.missing.len();

        if gap.missing.is_empty() && !options.force {
            return detail;
        }

        if options.dry_run {
            detail.outcome = StockOutcome::Planned {
                missing_dates: gap.missing,
            };
            return detail;
        }

        detail.outcome = match self.collect(stock, options, window, &gap.missing).await {
            Ok(collected_dates) => StockOutcome::Collected {
                missing_dates: detail.missing_count,
                collected_dates,
            },
            Err(e) => {
                warn!(error = %e, "종목 수집 실패");
                StockOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        };

        detail
    }

    /// 외부 소스에서 가져와 구간 안의 행을 저장합니다. 저장한 날짜 수를 반환합니다.
    async fn collect(
        &self,
        stock: &Stock,
        options: &SyncOptions,
        window: (NaiveDate, NaiveDate),
        missing: &[NaiveDate],
    ) -> StockResult<usize> {
        let fetched = self
            .source
            .fetch_daily(&stock.stock_code, options.max_pages)
            .await?;
        let fetched_count = fetched.len();

        let missing: BTreeSet<NaiveDate> = missing.iter().copied().collect();
        let rows: Vec<_> = fetched
            .into_iter()
            .filter(|row| row.stock_code == stock.stock_code)
            .filter(|row| row.trade_date >= window.0 && row.trade_date <= window.1)
            .filter(|row| options.force || missing.contains(&row.trade_date))
            .collect();

        info!(fetched = fetched_count, to_store = rows.len(), "수집 데이터 필터링");

        if rows.is_empty() {
            return Ok(0);
        }

        let summary = self.trading.store_collected(rows, options.force).await?;
        Ok(summary.total())
    }

    async fn find_stock(&self, stock_code: &str) -> StockResult<Stock> {
        validate_stock_code(stock_code)?;
        self.stocks
            .get_stock_by_code(stock_code)
            .await?
            .ok_or_else(|| StockError::user(format!("Stock not found: {}", stock_code)))
    }

    async fn find_gap(
        &self,
        stock: &Stock,
        window: (NaiveDate, NaiveDate),
        candidates: &[NaiveDate],
    ) -> StockResult<Gap> {
        let latest_date = self.trading.latest_date(&stock.stock_code).await?;
        let persisted: BTreeSet<NaiveDate> = self
            .trading
            .persisted_dates(&stock.stock_code, window.0, window.1)
            .await?
            .into_iter()
            .collect();

        Ok(Gap {
            latest_date,
            missing: missing_dates(candidates, &persisted),
        })
    }

    async fn write_run_log(&self, report: &SyncReport) {
        let level = if report.is_success() {
            LogLevel::Info
        } else {
            LogLevel::Warning
        };
        let message = format!(
            "증분 동기화: 전체 {}, 수집 {}, 건너뜀 {}, 실패 {}",
            report.total_stocks, report.collected_stocks, report.skipped_stocks, report.failed_stocks
        );

        let details = match serde_json::to_value(report) {
            Ok(details) => details,
            Err(e) => serde_json::json!({ "serialization_error": e.to_string() }),
        };

        let log = NewSystemLog::new(level, LogCategory::Collector, message).with_details(details);
        if let Err(e) = self.history.record_system_log(log).await {
            error!(error = %e, "동기화 시스템 로그 저장 실패");
        }
    }
}

/// 후보 거래일 중 저장되지 않은 날짜 (오름차순 유지).
pub fn missing_dates(candidates: &[NaiveDate], persisted: &BTreeSet<NaiveDate>) -> Vec<NaiveDate> {
    candidates
        .iter()
        .filter(|d| !persisted.contains(d))
        .copied()
        .collect()
}
