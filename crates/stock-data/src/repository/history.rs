//! 변경 이력 저장소 (추가/조회 전용).

use sqlx::{Executor, Sqlite};
use stock_core::{DataHistory, HistoryQuery, NewHistoryEntry};

pub struct HistoryRepository;

impl HistoryRepository {
    pub async fn insert<'e, E>(executor: E, entry: &NewHistoryEntry) -> Result<i64, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO data_history (
                action, table_name, record_id, field_name, old_value, new_value, description
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            RETURNING id
            "#,
        )
        .bind(entry.action)
        .bind(entry.table_name)
        .bind(entry.record_id)
        .bind(&entry.field_name)
        .bind(&entry.old_value)
        .bind(&entry.new_value)
        .bind(&entry.description)
        .fetch_one(executor)
        .await
    }

    /// 최신 항목이 먼저 옵니다.
    pub async fn list<'e, E>(
        executor: E,
        query: &HistoryQuery,
        limit: i64,
    ) -> Result<Vec<DataHistory>, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, DataHistory>(
            r#"
            SELECT * FROM data_history
            WHERE (?1 IS NULL OR table_name = ?1)
              AND (?2 IS NULL OR action = ?2)
              AND (?3 IS NULL OR record_id = ?3)
            ORDER BY created_at DESC, id DESC
            LIMIT ?4
            "#,
        )
        .bind(&query.table_name)
        .bind(query.action)
        .bind(query.record_id)
        .bind(limit)
        .fetch_all(executor)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::memory_database;
    use stock_core::HistoryAction;

    #[tokio::test]
    async fn test_insert_and_filter() {
        let db = memory_database().await;

        let create = NewHistoryEntry::new(HistoryAction::Create, "stocks", 1)
            .field("stock_name", None, Some("삼성전자".to_string()))
            .describe("새 종목 생성");
        let update = NewHistoryEntry::new(HistoryAction::Update, "stocks", 1).field(
            "stock_name",
            Some("삼성전자".to_string()),
            Some("삼성전자우".to_string()),
        );
        let other = NewHistoryEntry::new(HistoryAction::Create, "stock_trading", 7);

        for entry in [&create, &update, &other] {
            HistoryRepository::insert(db.pool(), entry).await.unwrap();
        }

        let all = HistoryRepository::list(db.pool(), &HistoryQuery::default(), 10)
            .await
            .unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].table_name, "stock_trading");

        let updates = HistoryRepository::list(
            db.pool(),
            &HistoryQuery {
                action: Some(HistoryAction::Update),
                ..Default::default()
            },
            10,
        )
        .await
        .unwrap();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].old_value.as_deref(), Some("삼성전자"));
        assert_eq!(updates[0].new_value.as_deref(), Some("삼성전자우"));

        let stocks = HistoryRepository::list(
            db.pool(),
            &HistoryQuery {
                table_name: Some("stocks".to_string()),
                ..Default::default()
            },
            10,
        )
        .await
        .unwrap();
        assert_eq!(stocks.len(), 2);
        assert_eq!(stocks[1].description.as_deref(), Some("새 종목 생성"));
    }
}
