//! 종목 저장소.

use sqlx::{Executor, Sqlite};
use stock_core::{MarketCount, NewStock, Stock, StockUpdate};

/// 종목 저장소.
pub struct StockRepository;

impl StockRepository {
    /// 종목 목록을 코드 순으로 조회합니다. `limit`가 `None`이면 전체를 반환합니다.
    pub async fn list<'e, E>(
        executor: E,
        market: Option<&str>,
        limit: Option<i64>,
        offset: i64,
    ) -> Result<Vec<Stock>, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, Stock>(
            r#"
            SELECT * FROM stocks
            WHERE (?1 IS NULL OR market = ?1)
            ORDER BY stock_code
            LIMIT ?2 OFFSET ?3
            "#,
        )
        .bind(market)
        .bind(limit.unwrap_or(-1))
        .bind(offset.max(0))
        .fetch_all(executor)
        .await
    }

    pub async fn find_by_id<'e, E>(executor: E, id: i64) -> Result<Option<Stock>, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, Stock>("SELECT * FROM stocks WHERE id = ?1")
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    pub async fn find_by_code<'e, E>(
        executor: E,
        stock_code: &str,
    ) -> Result<Option<Stock>, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, Stock>("SELECT * FROM stocks WHERE stock_code = ?1")
            .bind(stock_code)
            .fetch_optional(executor)
            .await
    }

    pub async fn insert<'e, E>(executor: E, input: &NewStock) -> Result<Stock, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, Stock>(
            r#"
            INSERT INTO stocks (
                stock_code, stock_name, market, sector, init_date,
                institution_accum_init, foreigner_accum_init
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            RETURNING *
            "#,
        )
        .bind(&input.stock_code)
        .bind(&input.stock_name)
        .bind(&input.market)
        .bind(&input.sector)
        .bind(input.init_date)
        .bind(input.institution_accum_init)
        .bind(input.foreigner_accum_init)
        .fetch_one(executor)
        .await
    }

    /// 지정된 필드만 갱신합니다. `stock_code`는 갱신 대상이 아닙니다.
    pub async fn update<'e, E>(
        executor: E,
        id: i64,
        update: &StockUpdate,
    ) -> Result<Option<Stock>, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, Stock>(
            r#"
            UPDATE stocks
            SET
                stock_name = COALESCE(?2, stock_name),
                market = COALESCE(?3, market),
                sector = COALESCE(?4, sector),
                init_date = COALESCE(?5, init_date),
                institution_accum_init = COALESCE(?6, institution_accum_init),
                foreigner_accum_init = COALESCE(?7, foreigner_accum_init),
                updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
            WHERE id = ?1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&update.stock_name)
        .bind(&update.market)
        .bind(&update.sector)
        .bind(update.init_date)
        .bind(update.institution_accum_init)
        .bind(update.foreigner_accum_init)
        .fetch_optional(executor)
        .await
    }

    /// 종목을 삭제합니다. 거래 기록은 FK cascade로 함께 삭제됩니다.
    pub async fn delete<'e, E>(executor: E, id: i64) -> Result<bool, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query("DELETE FROM stocks WHERE id = ?1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// 시장별 종목 수. 시장이 비어 있는 종목은 `UNKNOWN`으로 집계합니다.
    pub async fn count_by_market<'e, E>(executor: E) -> Result<Vec<MarketCount>, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, MarketCount>(
            r#"
            SELECT COALESCE(market, 'UNKNOWN') AS market, COUNT(*) AS count
            FROM stocks
            GROUP BY COALESCE(market, 'UNKNOWN')
            ORDER BY market
            "#,
        )
        .fetch_all(executor)
        .await
    }
}
