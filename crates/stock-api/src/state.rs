//! 모든 핸들러에서 공유되는 애플리케이션 상태.
//!
//! AppState는 Arc로 래핑되어 여러 요청 간에 공유됩니다.
//! TTL 캐시를 제외하면 생성 이후 변경되지 않습니다.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use stock_core::{CacheKey, StockStats, TtlCache};
use stock_data::{
    Database, HistoryService, Reconciler, StockService, TradingDataSource, TradingService,
};
use tracing::warn;

/// 통계 캐시 타입
pub type StatsCache = TtlCache<CacheKey, StockStats>;

/// 애플리케이션 공유 상태.
#[derive(Clone)]
pub struct AppState {
    /// 헬스 체크용 연결 풀
    pub db: Database,

    pub stocks: StockService,
    pub trading: TradingService,
    pub history: HistoryService,

    /// 증분 동기화 엔진 (수집 API)
    pub reconciler: Reconciler,

    /// `/stocks/stats` 응답 캐시
    pub stats_cache: Arc<StatsCache>,

    /// API 버전
    pub version: String,

    /// 서버 시작 시간
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(db: Database, source: Arc<dyn TradingDataSource>, stats_ttl: Duration) -> Self {
        Self {
            stocks: StockService::new(db.clone()),
            trading: TradingService::new(db.clone()),
            history: HistoryService::new(db.clone()),
            reconciler: Reconciler::new(db.clone(), source),
            stats_cache: Arc::new(TtlCache::new(stats_ttl)),
            version: env!("CARGO_PKG_VERSION").to_string(),
            started_at: Utc::now(),
            db,
        }
    }

    /// 서버 업타임(초)
    pub fn uptime_secs(&self) -> i64 {
        (Utc::now() - self.started_at).num_seconds()
    }

    /// `SELECT 1`로 DB 연결을 확인합니다. 실패는 로그로 남깁니다.
    pub async fn is_db_healthy(&self) -> bool {
        match self.db.ping().await {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "Database health check failed");
                false
            }
        }
    }
}

/// 테스트용 AppState 생성 헬퍼.
///
/// 마이그레이션된 인메모리 DB와 빈 가짜 데이터 소스를 사용합니다.
#[cfg(any(test, feature = "test-utils"))]
pub async fn create_test_state() -> AppState {
    use stock_data::testing::{memory_database, StaticSource};

    let db = memory_database().await;
    AppState::new(db, Arc::new(StaticSource::default()), Duration::from_secs(300))
}
