//! SQLite 연결 풀과 트랜잭션 경계.

use futures::future::BoxFuture;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::SqliteConnection;
use std::str::FromStr;
use stock_core::{DatabaseConfig, StockError, StockResult};
use tracing::{debug, error, info};

/// 데이터베이스 연결 풀 래퍼.
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// 새로운 데이터베이스 연결 풀을 생성합니다.
    ///
    /// 파일 DB는 없으면 생성합니다. `:memory:` URL은 연결마다 별도 DB가 되므로
    /// 단일 연결로 고정하고 만료시키지 않습니다.
    pub async fn connect(config: &DatabaseConfig) -> StockResult<Self> {
        info!(url = %config.url, "Connecting to database...");

        let options = SqliteConnectOptions::from_str(&config.url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = if config.url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await?
        } else {
            SqlitePoolOptions::new()
                .max_connections(config.max_connections)
                .connect_with(options)
                .await?
        };

        info!("Database connection established");

        Ok(Self { pool })
    }

    /// 기존 연결 풀에서 Database 인스턴스를 생성합니다.
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// 내부 연결 풀을 반환합니다.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// 내장 마이그레이션을 실행합니다.
    pub async fn migrate(&self) -> StockResult<()> {
        debug!("Running database migrations...");
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        debug!("Migrations completed");
        Ok(())
    }

    /// `SELECT 1`로 저장소 연결을 확인합니다.
    pub async fn ping(&self) -> StockResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// [`transactional`]의 메서드 버전.
    pub async fn transaction<T, F>(&self, work: F) -> StockResult<T>
    where
        T: Send,
        F: for<'c> FnOnce(&'c mut SqliteConnection) -> BoxFuture<'c, StockResult<T>> + Send,
    {
        transactional(&self.pool, work).await
    }
}

/// 작업 단위를 하나의 트랜잭션으로 실행합니다.
///
/// `Ok`이면 커밋하고, `Err`이면 롤백한 뒤 원래 에러를 그대로 반환합니다.
/// 롤백 실패는 로그로만 남기며 원래 에러를 덮어쓰지 않습니다.
///
/// 중첩 호출은 지원하지 않습니다. 클로저는 풀이 아닌 트랜잭션 연결을 받으므로
/// 안쪽에서 다시 `transactional`을 호출할 수 없고, 필요한 데이터는 소유권을
/// 넘겨(`move`) 받아야 합니다.
///
/// ```rust,ignore
/// let stock = transactional(&pool, move |conn| {
///     Box::pin(async move {
///         let stock = StockRepository::insert(&mut *conn, &new_stock).await?;
///         HistoryRepository::insert(&mut *conn, &entry).await?;
///         Ok(stock)
///     })
/// })
/// .await?;
/// ```
pub async fn transactional<T, F>(pool: &SqlitePool, work: F) -> StockResult<T>
where
    T: Send,
    F: for<'c> FnOnce(&'c mut SqliteConnection) -> BoxFuture<'c, StockResult<T>> + Send,
{
    let mut tx = pool.begin().await?;

    match work(&mut *tx).await {
        Ok(value) => {
            tx.commit().await?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = tx.rollback().await {
                error!(
                    error = %rollback_err,
                    original_error = %err,
                    "Transaction rollback failed"
                );
            } else {
                debug!(error = %err, "Transaction rolled back");
            }
            Err(err)
        }
    }
}

/// 고유 제약 조건 위반 여부.
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.is_unique_violation())
}

/// sqlx 에러를 도메인 에러로 변환하면서 고유 제약 위반은 `None`으로 돌려줍니다.
pub(crate) fn unique_or_error<T>(result: Result<T, sqlx::Error>) -> StockResult<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(err) if is_unique_violation(&err) => Ok(None),
        Err(err) => Err(StockError::from(err)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::memory_database;

    async fn count_stocks(pool: &SqlitePool) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM stocks")
            .fetch_one(pool)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_commit_on_success() {
        let db = memory_database().await;

        let id: i64 = transactional(db.pool(), |conn| {
            Box::pin(async move {
                let id = sqlx::query_scalar(
                    "INSERT INTO stocks (stock_code, stock_name) VALUES ('005930', '삼성전자') RETURNING id",
                )
                .fetch_one(&mut *conn)
                .await?;
                Ok(id)
            })
        })
        .await
        .unwrap();

        assert!(id > 0);
        assert_eq!(count_stocks(db.pool()).await, 1);
    }

    #[tokio::test]
    async fn test_rollback_returns_original_error() {
        let db = memory_database().await;

        let result: StockResult<()> = db
            .transaction(|conn| {
                Box::pin(async move {
                    sqlx::query(
                        "INSERT INTO stocks (stock_code, stock_name) VALUES ('000660', 'SK하이닉스')",
                    )
                    .execute(&mut *conn)
                    .await?;
                    Err(StockError::trading("중간 실패"))
                })
            })
            .await;

        assert_eq!(result, Err(StockError::trading("중간 실패")));
        assert_eq!(count_stocks(db.pool()).await, 0);
    }

    #[tokio::test]
    async fn test_unique_violation_detected() {
        let db = memory_database().await;
        let insert = "INSERT INTO stocks (stock_code, stock_name) VALUES ('035420', 'NAVER')";

        sqlx::query(insert).execute(db.pool()).await.unwrap();
        let second = sqlx::query(insert).execute(db.pool()).await;

        assert!(matches!(unique_or_error(second), Ok(None)));
    }

    #[tokio::test]
    async fn test_ping() {
        let db = memory_database().await;
        assert!(db.ping().await.is_ok());

        db.pool().close().await;
        assert!(db.ping().await.is_err());
    }
}
