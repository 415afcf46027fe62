//! 종목 조회/변경 서비스.

use super::{Mutation, STOCKS_TABLE};
use crate::db::{unique_or_error, Database};
use crate::repository::{HistoryRepository, StockRepository};
use chrono::Utc;
use stock_core::{
    HistoryAction, NewHistoryEntry, NewStock, Stock, StockError, StockResult, StockStats,
    StockUpdate,
};
use tracing::{debug, info};

#[derive(Clone)]
pub struct StockService {
    db: Database,
}

impl StockService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn list_stocks(
        &self,
        market: Option<&str>,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> StockResult<Vec<Stock>> {
        let limit = limit.map(|l| crate::repository::clamp_limit(Some(l)));
        Ok(StockRepository::list(self.db.pool(), market, limit, offset.unwrap_or(0)).await?)
    }

    /// 전체 종목 (코드 순).
    pub async fn all_stocks(&self) -> StockResult<Vec<Stock>> {
        Ok(StockRepository::list(self.db.pool(), None, None, 0).await?)
    }

    pub async fn get_stock(&self, id: i64) -> StockResult<Option<Stock>> {
        Ok(StockRepository::find_by_id(self.db.pool(), id).await?)
    }

    pub async fn get_stock_by_code(&self, stock_code: &str) -> StockResult<Option<Stock>> {
        Ok(StockRepository::find_by_code(self.db.pool(), stock_code).await?)
    }

    /// 종목을 생성합니다. 같은 코드가 있으면 `Conflict`.
    pub async fn create_stock(&self, input: NewStock) -> StockResult<Mutation<Stock>> {
        input.check()?;

        let result = self
            .db
            .transaction(move |conn| {
                Box::pin(async move {
                    let inserted =
                        unique_or_error(StockRepository::insert(&mut *conn, &input).await)?;
                    let Some(stock) = inserted else {
                        return Ok(Mutation::Conflict(format!(
                            "Stock code already exists: {}",
                            input.stock_code
                        )));
                    };

                    let entry = NewHistoryEntry::new(HistoryAction::Create, STOCKS_TABLE, stock.id)
                        .field("stock_code", None, Some(stock.stock_code.clone()))
                        .describe(format!("새 종목 생성: {}", stock));
                    HistoryRepository::insert(&mut *conn, &entry).await?;

                    Ok(Mutation::Applied(stock))
                })
            })
            .await?;

        if let Mutation::Applied(stock) = &result {
            info!(stock_code = %stock.stock_code, id = stock.id, "Stock created");
        }
        Ok(result)
    }

    /// 지정된 필드만 변경합니다.
    ///
    /// `stock_code`를 다른 값으로 바꾸려 하면 `Validation` 에러입니다.
    /// 실제로 바뀐 필드마다 이력 한 건을 같은 트랜잭션에서 기록합니다.
    pub async fn update_stock(&self, id: i64, update: StockUpdate) -> StockResult<Mutation<Stock>> {
        update.check()?;

        self.db
            .transaction(move |conn| {
                Box::pin(async move {
                    let Some(current) = StockRepository::find_by_id(&mut *conn, id).await? else {
                        return Ok(Mutation::NotFound(format!("Stock not found: {}", id)));
                    };

                    if let Some(code) = &update.stock_code {
                        if code != &current.stock_code {
                            return Err(StockError::validation("stock_code cannot be changed"));
                        }
                    }

                    let changes = update.changes(&current);
                    if changes.is_empty() {
                        debug!(id, "Stock update has no changes");
                        return Ok(Mutation::Applied(current));
                    }

                    let updated = StockRepository::update(&mut *conn, id, &update)
                        .await?
                        .ok_or_else(|| StockError::database(format!("Stock vanished: {}", id)))?;

                    for change in changes {
                        let entry = NewHistoryEntry::new(HistoryAction::Update, STOCKS_TABLE, id)
                            .field(change.field, change.old_value, change.new_value)
                            .describe(format!("종목 수정: {}", updated.stock_code));
                        HistoryRepository::insert(&mut *conn, &entry).await?;
                    }

                    Ok(Mutation::Applied(updated))
                })
            })
            .await
    }

    /// 종목을 삭제합니다. 없으면 `false`.
    pub async fn delete_stock(&self, id: i64) -> StockResult<bool> {
        self.db
            .transaction(move |conn| {
                Box::pin(async move {
                    let Some(stock) = StockRepository::find_by_id(&mut *conn, id).await? else {
                        return Ok(false);
                    };

                    StockRepository::delete(&mut *conn, id).await?;

                    let entry = NewHistoryEntry::new(HistoryAction::Delete, STOCKS_TABLE, id)
                        .field("stock_code", Some(stock.stock_code.clone()), None)
                        .describe(format!("종목 삭제: {}", stock));
                    HistoryRepository::insert(&mut *conn, &entry).await?;

                    info!(stock_code = %stock.stock_code, id, "Stock deleted");
                    Ok(true)
                })
            })
            .await
    }

    /// 시장별 종목 수 통계.
    pub async fn stats(&self) -> StockResult<StockStats> {
        let by_market = StockRepository::count_by_market(self.db.pool()).await?;
        let total_stocks = by_market.iter().map(|m| m.count).sum();

        Ok(StockStats {
            total_stocks,
            by_market,
            generated_at: Utc::now(),
        })
    }
}
