//! 거래 기록 조회/저장 서비스.

use super::{Mutation, TRADING_TABLE};
use crate::db::{unique_or_error, Database};
use crate::repository::{clamp_limit, HistoryRepository, StockRepository, TradingRepository};
use chrono::NaiveDate;
use std::collections::BTreeSet;
use stock_core::{
    validate_stock_code, HistoryAction, NewHistoryEntry, NewTradingRecord, StockResult,
    TradingQuery, TradingRecord,
};

#[derive(Clone)]
pub struct TradingService {
    db: Database,
}

/// 수집 데이터 저장 결과.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreSummary {
    pub inserted: usize,
    pub updated: usize,
}

impl StoreSummary {
    pub fn total(&self) -> usize {
        self.inserted + self.updated
    }
}

impl TradingService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// 거래 기록 한 건을 추가합니다.
    ///
    /// 종목이 없으면 `NotFound`, 같은 날짜 기록이 있으면 `Conflict`.
    pub async fn create_record(
        &self,
        record: NewTradingRecord,
    ) -> StockResult<Mutation<TradingRecord>> {
        record.check()?;

        self.db
            .transaction(move |conn| {
                Box::pin(async move {
                    if StockRepository::find_by_code(&mut *conn, &record.stock_code)
                        .await?
                        .is_none()
                    {
                        return Ok(Mutation::NotFound(format!(
                            "Stock not found: {}",
                            record.stock_code
                        )));
                    }

                    let inserted =
                        unique_or_error(TradingRepository::insert(&mut *conn, &record).await)?;
                    let Some(saved) = inserted else {
                        return Ok(Mutation::Conflict(format!(
                            "Trading record already exists: {} {}",
                            record.stock_code, record.trade_date
                        )));
                    };

                    let entry = NewHistoryEntry::new(HistoryAction::Create, TRADING_TABLE, saved.id)
                        .field("trade_date", None, Some(saved.trade_date.to_string()))
                        .describe(format!("거래 기록 추가: {}", saved.stock_code));
                    HistoryRepository::insert(&mut *conn, &entry).await?;

                    Ok(Mutation::Applied(saved))
                })
            })
            .await
    }

    /// 기간 조건으로 조회합니다 (최신순).
    pub async fn list_records(
        &self,
        stock_code: &str,
        query: &TradingQuery,
    ) -> StockResult<Vec<TradingRecord>> {
        validate_stock_code(stock_code)?;
        let limit = clamp_limit(query.limit);
        Ok(TradingRepository::list(self.db.pool(), stock_code, query, limit).await?)
    }

    pub async fn latest_record(&self, stock_code: &str) -> StockResult<Option<TradingRecord>> {
        validate_stock_code(stock_code)?;
        Ok(TradingRepository::latest(self.db.pool(), stock_code).await?)
    }

    pub async fn latest_date(&self, stock_code: &str) -> StockResult<Option<NaiveDate>> {
        Ok(TradingRepository::latest_date(self.db.pool(), stock_code).await?)
    }

    /// `[start, end]` 구간에 이미 저장된 거래일.
    pub async fn persisted_dates(
        &self,
        stock_code: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> StockResult<Vec<NaiveDate>> {
        Ok(TradingRepository::dates_between(self.db.pool(), stock_code, start, end).await?)
    }

    /// 수집한 행을 하나의 트랜잭션으로 저장합니다.
    ///
    /// `overwrite`가 꺼져 있으면 새 날짜만 추가하고, 켜져 있으면 기존 날짜를 덮어씁니다.
    /// 저장한 행마다 이력 한 건을 남깁니다. 하나라도 실패하면 전체가 롤백됩니다.
    /// 저장 후 해당 종목의 누적 순매수(`*_accum`)를 기준값부터 다시 계산합니다.
    pub async fn store_collected(
        &self,
        rows: Vec<NewTradingRecord>,
        overwrite: bool,
    ) -> StockResult<StoreSummary> {
        for row in &rows {
            row.check()?;
        }

        self.db
            .transaction(move |conn| {
                Box::pin(async move {
                    let mut summary = StoreSummary::default();

                    for row in &rows {
                        let existed = overwrite
                            && TradingRepository::exists(&mut *conn, &row.stock_code, row.trade_date)
                                .await?;

                        let saved = if overwrite {
                            TradingRepository::upsert(&mut *conn, row).await?
                        } else {
                            TradingRepository::insert(&mut *conn, row).await?
                        };

                        let (action, description) = if existed {
                            summary.updated += 1;
                            (HistoryAction::Update, "증분 수집 (덮어쓰기)")
                        } else {
                            summary.inserted += 1;
                            (HistoryAction::Create, "증분 수집")
                        };

                        let entry = NewHistoryEntry::new(action, TRADING_TABLE, saved.id)
                            .field("close_price", None, Some(saved.close_price.to_string()))
                            .describe(format!("{}: {} {}", description, saved.stock_code, saved.trade_date));
                        HistoryRepository::insert(&mut *conn, &entry).await?;
                    }

                    let codes: BTreeSet<&str> = rows.iter().map(|r| r.stock_code.as_str()).collect();
                    for code in codes {
                        TradingRepository::recompute_accum(&mut *conn, code).await?;
                    }

                    Ok(summary)
                })
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{date, memory_database, samsung, StockFactory, TradingFactory};
    use stock_core::HistoryQuery;

    #[tokio::test]
    async fn test_create_record() {
        let db = memory_database().await;
        samsung(db.pool()).await;
        let service = TradingService::new(db);

        let record = NewTradingRecord::new("005930", date(2024, 1, 2))
            .with_close(50500, 1000)
            .with_net_buy(100000, 200000);
        let saved = service.create_record(record.clone()).await.unwrap().applied().unwrap();
        assert_eq!(saved.close_price, 50500);
        assert_eq!(saved.foreigner_net_buy, 200000);

        let again = service.create_record(record).await.unwrap();
        assert!(matches!(again, Mutation::Conflict(_)));
    }

    #[tokio::test]
    async fn test_create_record_for_unknown_stock() {
        let db = memory_database().await;
        let service = TradingService::new(db);

        let result = service
            .create_record(NewTradingRecord::new("111111", date(2024, 1, 2)))
            .await
            .unwrap();
        assert!(matches!(result, Mutation::NotFound(_)));
    }

    #[tokio::test]
    async fn test_negative_values_are_validation_errors() {
        let db = memory_database().await;
        samsung(db.pool()).await;
        let service = TradingService::new(db);

        let err = service
            .create_record(NewTradingRecord::new("005930", date(2024, 1, 2)).with_close(-1000, 0))
            .await
            .unwrap_err();
        assert!(err.is_client_error());
    }

    #[tokio::test]
    async fn test_list_and_latest() {
        let db = memory_database().await;
        samsung(db.pool()).await;
        TradingFactory::daily(db.pool(), "005930", date(2024, 3, 1), 5).await;
        let service = TradingService::new(db);

        let latest = service.latest_record("005930").await.unwrap().unwrap();
        assert_eq!(latest.trade_date, date(2024, 3, 5));

        let query = TradingQuery {
            limit: Some(2),
            ..Default::default()
        };
        let records = service.list_records("005930", &query).await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].trade_date, date(2024, 3, 5));

        assert!(service.latest_record("035420").await.unwrap().is_none());
        assert!(service.latest_record("bad").await.is_err());
    }

    #[tokio::test]
    async fn test_store_collected_insert_and_overwrite() {
        let db = memory_database().await;
        samsung(db.pool()).await;
        let service = TradingService::new(db.clone());

        let rows = vec![
            NewTradingRecord::new("005930", date(2024, 1, 2)).with_close(70000, 10),
            NewTradingRecord::new("005930", date(2024, 1, 3)).with_close(71000, 20),
        ];
        let summary = service.store_collected(rows, false).await.unwrap();
        assert_eq!(summary, StoreSummary { inserted: 2, updated: 0 });

        let rows = vec![
            NewTradingRecord::new("005930", date(2024, 1, 3)).with_close(72000, 30),
            NewTradingRecord::new("005930", date(2024, 1, 4)).with_close(73000, 40),
        ];
        let summary = service.store_collected(rows, true).await.unwrap();
        assert_eq!(summary, StoreSummary { inserted: 1, updated: 1 });
        assert_eq!(summary.total(), 2);

        let latest = service.latest_record("005930").await.unwrap().unwrap();
        assert_eq!(latest.close_price, 73000);

        let history = HistoryRepository::list(db.pool(), &HistoryQuery::default(), 100)
            .await
            .unwrap();
        assert_eq!(history.len(), 4);
    }

    #[tokio::test]
    async fn test_store_collected_accumulates_from_baseline() {
        let db = memory_database().await;
        let stock = StockFactory::new()
            .create(db.pool(), |mut s| {
                s.institution_accum_init = 1000;
                s.foreigner_accum_init = 2000;
                s
            })
            .await;
        let code = stock.stock_code.as_str();
        let service = TradingService::new(db.clone());

        let rows = vec![
            NewTradingRecord::new(code, date(2024, 1, 3)).with_net_buy(10, -5),
            NewTradingRecord::new(code, date(2024, 1, 4)).with_net_buy(20, 5),
        ];
        service.store_collected(rows, false).await.unwrap();

        let accum = |records: &[TradingRecord]| -> Vec<(i64, i64)> {
            records
                .iter()
                .rev()
                .map(|r| (r.institution_accum, r.foreigner_accum))
                .collect()
        };
        let records = service.list_records(code, &TradingQuery::default()).await.unwrap();
        assert_eq!(accum(&records), vec![(1010, 1995), (1030, 2000)]);

        // 앞쪽 빈 날짜를 채우면 이후 누적값도 함께 바뀜
        let rows = vec![NewTradingRecord::new(code, date(2024, 1, 2)).with_net_buy(100, 100)];
        service.store_collected(rows, false).await.unwrap();

        let records = service.list_records(code, &TradingQuery::default()).await.unwrap();
        assert_eq!(accum(&records), vec![(1100, 2100), (1110, 2095), (1130, 2100)]);
    }

    #[tokio::test]
    async fn test_store_collected_rolls_back_on_failure() {
        let db = memory_database().await;
        samsung(db.pool()).await;
        let service = TradingService::new(db.clone());

        // 두 번째 행이 중복이므로 전체가 롤백되어야 함
        let rows = vec![
            NewTradingRecord::new("005930", date(2024, 1, 2)).with_close(70000, 10),
            NewTradingRecord::new("005930", date(2024, 1, 2)).with_close(70000, 10),
        ];
        assert!(service.store_collected(rows, false).await.is_err());
        assert_eq!(
            TradingRepository::count_for(db.pool(), "005930").await.unwrap(),
            0
        );
    }
}
