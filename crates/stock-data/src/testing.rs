//! 테스트 헬퍼.
//!
//! 인메모리 DB, 종목/거래 기록 팩토리, 가짜 데이터 소스를 제공합니다.
//! 다른 크레이트의 테스트에서는 `test-utils` feature로 사용합니다.

use crate::db::Database;
use crate::provider::TradingDataSource;
use crate::repository::{StockRepository, TradingRepository};
use async_trait::async_trait;
use chrono::{Duration, NaiveDate};
use sqlx::SqlitePool;
use std::collections::HashSet;
use std::sync::Mutex;
use stock_core::{
    DatabaseConfig, NewStock, NewTradingRecord, Stock, StockError, StockResult, TradingRecord,
};

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

/// 마이그레이션이 적용된 인메모리 DB.
pub async fn memory_database() -> Database {
    let config = DatabaseConfig {
        url: "sqlite::memory:".to_string(),
        max_connections: 1,
    };
    let db = Database::connect(&config)
        .await
        .expect("Failed to open in-memory database");
    db.migrate().await.expect("Failed to run migrations");
    db
}

/// 순번 기반 종목 팩토리. 코드는 `000001`부터 증가합니다.
#[derive(Debug, Default)]
pub struct StockFactory {
    seq: u32,
}

impl StockFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn build(&mut self) -> NewStock {
        self.seq += 1;
        NewStock::new(format!("{:06}", self.seq), format!("테스트종목{}", self.seq))
    }

    pub async fn create(
        &mut self,
        pool: &SqlitePool,
        customize: impl FnOnce(NewStock) -> NewStock,
    ) -> Stock {
        let input = customize(self.build());
        StockRepository::insert(pool, &input)
            .await
            .expect("Failed to insert stock")
    }

    pub async fn create_many(&mut self, pool: &SqlitePool, count: usize) -> Vec<Stock> {
        let mut stocks = Vec::with_capacity(count);
        for _ in 0..count {
            stocks.push(self.create(pool, |s| s).await);
        }
        stocks
    }
}

async fn insert_stock(pool: &SqlitePool, input: NewStock) -> Stock {
    StockRepository::insert(pool, &input)
        .await
        .expect("Failed to insert stock")
}

pub async fn samsung(pool: &SqlitePool) -> Stock {
    insert_stock(
        pool,
        NewStock::new("005930", "삼성전자")
            .with_market("KOSPI")
            .with_sector("반도체")
            .with_init_date(date(1983, 1, 1)),
    )
    .await
}

pub async fn sk_hynix(pool: &SqlitePool) -> Stock {
    insert_stock(
        pool,
        NewStock::new("000660", "SK하이닉스")
            .with_market("KOSPI")
            .with_sector("반도체")
            .with_init_date(date(1996, 1, 1)),
    )
    .await
}

pub async fn naver(pool: &SqlitePool) -> Stock {
    insert_stock(
        pool,
        NewStock::new("035420", "NAVER")
            .with_market("KOSPI")
            .with_sector("인터넷")
            .with_init_date(date(2002, 1, 1)),
    )
    .await
}

/// 거래 기록 팩토리.
pub struct TradingFactory;

impl TradingFactory {
    /// `i`번째 행: 종가 `50000 + i * 100`, 거래량 `1000 + i`.
    pub fn build(stock_code: &str, trade_date: NaiveDate, i: i64) -> NewTradingRecord {
        NewTradingRecord::new(stock_code, trade_date)
            .with_ohlc(49900 + i * 100, 50500 + i * 100, 49500 + i * 100, 50000 + i * 100)
            .with_close(50000 + i * 100, 1000 + i)
            .with_net_buy(i * 10, -i * 10)
    }

    pub async fn create(pool: &SqlitePool, record: &NewTradingRecord) -> TradingRecord {
        TradingRepository::insert(pool, record)
            .await
            .expect("Failed to insert trading record")
    }

    /// `start`부터 주말 포함 연속 `days`일.
    pub async fn daily(
        pool: &SqlitePool,
        stock_code: &str,
        start: NaiveDate,
        days: i64,
    ) -> Vec<TradingRecord> {
        let dates: Vec<_> = (0..days).map(|i| start + Duration::days(i)).collect();
        Self::on_dates(pool, stock_code, &dates).await
    }

    pub async fn on_dates(
        pool: &SqlitePool,
        stock_code: &str,
        dates: &[NaiveDate],
    ) -> Vec<TradingRecord> {
        let mut records = Vec::with_capacity(dates.len());
        for (i, d) in dates.iter().enumerate() {
            let row = Self::build(stock_code, *d, i as i64);
            records.push(Self::create(pool, &row).await);
        }
        records
    }
}

/// 미리 정한 행을 돌려주는 가짜 데이터 소스.
///
/// 호출 기록(`종목 코드`, `max_pages`)을 남기며, 지정한 종목은 수집 에러를 냅니다.
#[derive(Debug, Default)]
pub struct StaticSource {
    rows: Vec<NewTradingRecord>,
    failing: HashSet<String>,
    latency: Option<std::time::Duration>,
    calls: Mutex<Vec<(String, u32)>>,
}

impl StaticSource {
    pub fn with_rows(mut self, rows: Vec<NewTradingRecord>) -> Self {
        self.rows.extend(rows);
        self
    }

    pub fn failing(mut self, stock_code: &str) -> Self {
        self.failing.insert(stock_code.to_string());
        self
    }

    /// 호출마다 지연을 줍니다 (느린 외부 소스 흉내).
    pub fn with_latency(mut self, latency: std::time::Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn calls(&self) -> Vec<(String, u32)> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl TradingDataSource for StaticSource {
    fn name(&self) -> &str {
        "static"
    }

    async fn fetch_daily(
        &self,
        stock_code: &str,
        max_pages: u32,
    ) -> StockResult<Vec<NewTradingRecord>> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((stock_code.to_string(), max_pages));
        }

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        if self.failing.contains(stock_code) {
            return Err(StockError::data_collection(format!(
                "source unavailable for {}",
                stock_code
            )));
        }

        let mut rows: Vec<_> = self
            .rows
            .iter()
            .filter(|r| r.stock_code == stock_code)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.trade_date.cmp(&a.trade_date));
        Ok(rows)
    }
}
