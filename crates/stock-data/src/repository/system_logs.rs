//! 시스템 로그 저장소 (추가/조회 전용).

use sqlx::{Executor, Sqlite};
use stock_core::{NewSystemLog, SystemLog, SystemLogQuery};

pub struct SystemLogRepository;

impl SystemLogRepository {
    pub async fn insert<'e, E>(executor: E, log: &NewSystemLog) -> Result<i64, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let details = log.details.as_ref().map(|d| d.to_string());

        sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO system_logs (level, category, message, details)
            VALUES (?1, ?2, ?3, ?4)
            RETURNING id
            "#,
        )
        .bind(log.level)
        .bind(log.category)
        .bind(&log.message)
        .bind(details)
        .fetch_one(executor)
        .await
    }

    pub async fn list<'e, E>(
        executor: E,
        query: &SystemLogQuery,
        limit: i64,
    ) -> Result<Vec<SystemLog>, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, SystemLog>(
            r#"
            SELECT * FROM system_logs
            WHERE (?1 IS NULL OR category = ?1)
              AND (?2 IS NULL OR level = ?2)
            ORDER BY created_at DESC, id DESC
            LIMIT ?3
            "#,
        )
        .bind(query.category)
        .bind(query.level)
        .bind(limit)
        .fetch_all(executor)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::memory_database;
    use stock_core::{LogCategory, LogLevel};

    #[tokio::test]
    async fn test_details_stored_as_json_text() {
        let db = memory_database().await;

        let log = NewSystemLog::new(LogLevel::Info, LogCategory::Api, "API 요청 처리 완료")
            .with_details(serde_json::json!({"endpoint": "/api/v1/stocks", "method": "GET"}));
        SystemLogRepository::insert(db.pool(), &log).await.unwrap();
        SystemLogRepository::insert(
            db.pool(),
            &NewSystemLog::new(LogLevel::Warning, LogCategory::Collector, "일부 실패"),
        )
        .await
        .unwrap();

        let api = SystemLogRepository::list(
            db.pool(),
            &SystemLogQuery {
                category: Some(LogCategory::Api),
                ..Default::default()
            },
            10,
        )
        .await
        .unwrap();
        assert_eq!(api.len(), 1);

        let details: serde_json::Value =
            serde_json::from_str(api[0].details.as_deref().unwrap()).unwrap();
        assert_eq!(details["method"], "GET");

        let warnings = SystemLogRepository::list(
            db.pool(),
            &SystemLogQuery {
                level: Some(LogLevel::Warning),
                ..Default::default()
            },
            10,
        )
        .await
        .unwrap();
        assert_eq!(warnings[0].category, LogCategory::Collector);
        assert!(warnings[0].details.is_none());
    }
}
