//! 일별 거래 기록 저장소.

use chrono::NaiveDate;
use sqlx::{Executor, Sqlite};
use stock_core::{NewTradingRecord, TradingQuery, TradingRecord};

/// 거래 기록 저장소.
pub struct TradingRepository;

const INSERT_COLUMNS: &str = r#"
    INSERT INTO stock_trading (
        stock_code, trade_date, open_price, high_price, low_price, close_price, volume,
        institution_net_buy, foreigner_net_buy, institution_accum, foreigner_accum
    )
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
"#;

impl TradingRepository {
    /// 새 거래 기록을 추가합니다. `(stock_code, trade_date)`가 이미 있으면 고유 제약 에러가 납니다.
    pub async fn insert<'e, E>(
        executor: E,
        record: &NewTradingRecord,
    ) -> Result<TradingRecord, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let sql = format!("{INSERT_COLUMNS} RETURNING *");
        bind_record(sqlx::query_as::<_, TradingRecord>(&sql), record)
            .fetch_one(executor)
            .await
    }

    /// 같은 날짜의 기록이 있으면 값을 덮어씁니다.
    ///
    /// 들어온 행에 시가/고가/저가가 없으면 저장된 값을 유지합니다.
    pub async fn upsert<'e, E>(
        executor: E,
        record: &NewTradingRecord,
    ) -> Result<TradingRecord, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let sql = format!(
            r#"{INSERT_COLUMNS}
            ON CONFLICT (stock_code, trade_date) DO UPDATE SET
                open_price = COALESCE(excluded.open_price, stock_trading.open_price),
                high_price = COALESCE(excluded.high_price, stock_trading.high_price),
                low_price = COALESCE(excluded.low_price, stock_trading.low_price),
                close_price = excluded.close_price,
                volume = excluded.volume,
                institution_net_buy = excluded.institution_net_buy,
                foreigner_net_buy = excluded.foreigner_net_buy,
                institution_accum = excluded.institution_accum,
                foreigner_accum = excluded.foreigner_accum
            RETURNING *"#
        );
        bind_record(sqlx::query_as::<_, TradingRecord>(&sql), record)
            .fetch_one(executor)
            .await
    }

    /// 기간 조건으로 조회합니다. 최신 날짜가 먼저 옵니다.
    pub async fn list<'e, E>(
        executor: E,
        stock_code: &str,
        query: &TradingQuery,
        limit: i64,
    ) -> Result<Vec<TradingRecord>, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, TradingRecord>(
            r#"
            SELECT * FROM stock_trading
            WHERE stock_code = ?1
              AND (?2 IS NULL OR trade_date >= ?2)
              AND (?3 IS NULL OR trade_date <= ?3)
            ORDER BY trade_date DESC
            LIMIT ?4
            "#,
        )
        .bind(stock_code)
        .bind(query.start_date)
        .bind(query.end_date)
        .bind(limit)
        .fetch_all(executor)
        .await
    }

    pub async fn latest<'e, E>(
        executor: E,
        stock_code: &str,
    ) -> Result<Option<TradingRecord>, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, TradingRecord>(
            "SELECT * FROM stock_trading WHERE stock_code = ?1 ORDER BY trade_date DESC LIMIT 1",
        )
        .bind(stock_code)
        .fetch_optional(executor)
        .await
    }

    /// 가장 최근에 저장된 거래일.
    pub async fn latest_date<'e, E>(
        executor: E,
        stock_code: &str,
    ) -> Result<Option<NaiveDate>, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_scalar::<_, NaiveDate>(
            "SELECT trade_date FROM stock_trading WHERE stock_code = ?1 ORDER BY trade_date DESC LIMIT 1",
        )
        .bind(stock_code)
        .fetch_optional(executor)
        .await
    }

    /// `[start, end]` 구간에 저장된 거래일 (오름차순).
    pub async fn dates_between<'e, E>(
        executor: E,
        stock_code: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<NaiveDate>, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_scalar::<_, NaiveDate>(
            r#"
            SELECT trade_date FROM stock_trading
            WHERE stock_code = ?1 AND trade_date >= ?2 AND trade_date <= ?3
            ORDER BY trade_date
            "#,
        )
        .bind(stock_code)
        .bind(start)
        .bind(end)
        .fetch_all(executor)
        .await
    }

    pub async fn exists<'e, E>(
        executor: E,
        stock_code: &str,
        trade_date: NaiveDate,
    ) -> Result<bool, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM stock_trading WHERE stock_code = ?1 AND trade_date = ?2)",
        )
        .bind(stock_code)
        .bind(trade_date)
        .fetch_one(executor)
        .await
    }

    /// 누적 순매수를 다시 계산합니다.
    ///
    /// 각 행의 누적값 = 종목 기준값 + 해당 날짜까지의 순매수 합계.
    /// 중간 날짜가 채워져도 이후 행이 함께 맞춰집니다.
    pub async fn recompute_accum<'e, E>(executor: E, stock_code: &str) -> Result<u64, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query(
            r#"
            UPDATE stock_trading SET
                institution_accum = (
                    SELECT s.institution_accum_init FROM stocks s
                    WHERE s.stock_code = stock_trading.stock_code
                ) + (
                    SELECT SUM(t.institution_net_buy) FROM stock_trading t
                    WHERE t.stock_code = stock_trading.stock_code
                      AND t.trade_date <= stock_trading.trade_date
                ),
                foreigner_accum = (
                    SELECT s.foreigner_accum_init FROM stocks s
                    WHERE s.stock_code = stock_trading.stock_code
                ) + (
                    SELECT SUM(t.foreigner_net_buy) FROM stock_trading t
                    WHERE t.stock_code = stock_trading.stock_code
                      AND t.trade_date <= stock_trading.trade_date
                )
            WHERE stock_code = ?1
            "#,
        )
        .bind(stock_code)
        .execute(executor)
        .await?;

        Ok(result.rows_affected())
    }

    pub async fn count_for<'e, E>(executor: E, stock_code: &str) -> Result<i64, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM stock_trading WHERE stock_code = ?1")
            .bind(stock_code)
            .fetch_one(executor)
            .await
    }
}

type TradingQueryAs<'q> =
    sqlx::query::QueryAs<'q, Sqlite, TradingRecord, sqlx::sqlite::SqliteArguments<'q>>;

fn bind_record<'q>(query: TradingQueryAs<'q>, record: &'q NewTradingRecord) -> TradingQueryAs<'q> {
    query
        .bind(&record.stock_code)
        .bind(record.trade_date)
        .bind(record.open_price)
        .bind(record.high_price)
        .bind(record.low_price)
        .bind(record.close_price)
        .bind(record.volume)
        .bind(record.institution_net_buy)
        .bind(record.foreigner_net_buy)
        .bind(record.institution_accum)
        .bind(record.foreigner_accum)
}
