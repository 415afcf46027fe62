//! 변경 이력 및 시스템 로그 서비스.

use crate::db::Database;
use crate::repository::{clamp_limit, HistoryRepository, SystemLogRepository};
use stock_core::{DataHistory, HistoryQuery, NewSystemLog, StockResult, SystemLog, SystemLogQuery};

#[derive(Clone)]
pub struct HistoryService {
    db: Database,
}

impl HistoryService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn list_history(&self, query: &HistoryQuery) -> StockResult<Vec<DataHistory>> {
        let limit = clamp_limit(query.limit);
        Ok(HistoryRepository::list(self.db.pool(), query, limit).await?)
    }

    pub async fn list_system_logs(&self, query: &SystemLogQuery) -> StockResult<Vec<SystemLog>> {
        let limit = clamp_limit(query.limit);
        Ok(SystemLogRepository::list(self.db.pool(), query, limit).await?)
    }

    pub async fn record_system_log(&self, log: NewSystemLog) -> StockResult<i64> {
        Ok(SystemLogRepository::insert(self.db.pool(), &log).await?)
    }
}
