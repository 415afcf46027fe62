//! 외부 거래 데이터 소스.
//!
//! ## 네이버 금융
//! - `NaverFinanceSource`: 종목별 외국인/기관 순매매 일별 표 크롤러
//! - 종가, 거래량, 기관/외국인 순매수 수집

pub mod naver;

pub use naver::{NaverError, NaverFinanceSource};

use async_trait::async_trait;
use stock_core::{NewTradingRecord, StockResult};

/// 일별 거래 데이터 소스.
///
/// 증분 수집 엔진은 이 트레이트만 알며, 테스트에서는 가짜 구현으로 교체합니다.
#[async_trait]
pub trait TradingDataSource: Send + Sync {
    /// 소스 이름 (로그용)
    fn name(&self) -> &str;

    /// 최근 거래일부터 과거 방향으로 최대 `max_pages` 페이지를 가져옵니다.
    ///
    /// 날짜가 중복되지 않은 행을 반환하며, 실패는 `DataCollection` 에러입니다.
    async fn fetch_daily(
        &self,
        stock_code: &str,
        max_pages: u32,
    ) -> StockResult<Vec<NewTradingRecord>>;
}
