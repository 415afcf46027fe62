//! 요청 페이로드 → 도메인 검증 → 캐시 통합 테스트
//!
//! HTTP 계층이 받는 JSON을 그대로 역직렬화해 검증 규칙과 변경 감지를 확인합니다.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use stock_core::{
    CacheKey, ErrorKind, NewStock, NewTradingRecord, Stock, StockError, StockUpdate, TtlCache,
};

fn stored_stock() -> Stock {
    serde_json::from_value(json!({
        "id": 1,
        "stock_code": "005930",
        "stock_name": "삼성전자",
        "market": "KOSPI",
        "sector": null,
        "init_date": "1983-01-01",
        "institution_accum_init": 0,
        "foreigner_accum_init": 0,
        "created_at": "2024-01-01T00:00:00Z",
        "updated_at": "2024-01-01T00:00:00Z"
    }))
    .expect("valid stock json")
}

#[test]
fn test_new_stock_payload_defaults() {
    let input: NewStock = serde_json::from_value(json!({
        "stock_code": "000660",
        "stock_name": "SK하이닉스"
    }))
    .unwrap();

    assert!(input.check().is_ok());
    assert_eq!(input.market, None);
    assert_eq!(input.institution_accum_init, 0);
}

#[test]
fn test_new_stock_payload_rejections() {
    let bad_code: NewStock = serde_json::from_value(json!({
        "stock_code": "5930",
        "stock_name": "삼성전자"
    }))
    .unwrap();
    let err = bad_code.check().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert!(err.message().contains("5930"));

    let empty_name: NewStock = serde_json::from_value(json!({
        "stock_code": "005930",
        "stock_name": ""
    }))
    .unwrap();
    assert!(empty_name.check().is_err());
}

#[test]
fn test_trading_payload_rejects_negative_values() {
    let record: NewTradingRecord = serde_json::from_value(json!({
        "stock_code": "005930",
        "trade_date": "2024-01-15",
        "close_price": -1,
        "volume": -10
    }))
    .unwrap();

    let err = record.check().unwrap_err();
    assert_eq!(err.message(), "Must be non-negative: close_price, volume");
}

#[test]
fn test_update_payload_reports_only_real_changes() {
    let current = stored_stock();
    let update: StockUpdate = serde_json::from_value(json!({
        "stock_name": "삼성전자",
        "market": "KOSDAQ",
        "sector": "반도체"
    }))
    .unwrap();

    let changes = update.changes(&current);
    let fields: Vec<&str> = changes.iter().map(|c| c.field).collect();
    assert_eq!(fields, vec!["market", "sector"]);
    assert_eq!(changes[0].old_value.as_deref(), Some("KOSPI"));
    assert_eq!(changes[1].old_value, None);
}

#[tokio::test]
async fn test_cache_shares_result_across_callers() {
    let cache: Arc<TtlCache<CacheKey, usize>> = Arc::new(TtlCache::new(Duration::from_secs(60)));
    let computed = Arc::new(AtomicUsize::new(0));

    for _ in 0..3 {
        let computed = computed.clone();
        let value = cache
            .get_or_try_insert_with(CacheKey::new("stock_stats"), || async move {
                computed.fetch_add(1, Ordering::SeqCst);
                Ok::<_, StockError>(42)
            })
            .await
            .unwrap();
        assert_eq!(value, 42);
    }

    assert_eq!(computed.load(Ordering::SeqCst), 1);

    let failed = cache
        .get_or_try_insert_with(CacheKey::new("stock_stats").arg("KOSDAQ"), || async {
            Err::<usize, _>(StockError::database("unavailable"))
        })
        .await;
    assert!(failed.is_err());
    assert_eq!(cache.len(), 1);
}
