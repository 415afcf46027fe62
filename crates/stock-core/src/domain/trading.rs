//! 일별 거래 기록.
//!
//! 가격과 거래량은 원(KRW) 단위 정수입니다. 순매수/누적 값은 음수일 수 있습니다.

use crate::domain::validate_stock_code;
use crate::error::{StockError, StockResult};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// 저장된 거래 기록.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx-support", derive(sqlx::FromRow))]
pub struct TradingRecord {
    pub id: i64,
    pub stock_code: String,
    pub trade_date: NaiveDate,
    pub open_price: Option<i64>,
    pub high_price: Option<i64>,
    pub low_price: Option<i64>,
    pub close_price: i64,
    pub volume: i64,
    /// 기관 순매수
    pub institution_net_buy: i64,
    /// 외국인 순매수
    pub foreigner_net_buy: i64,
    /// 기관 누적 순매수
    pub institution_accum: i64,
    /// 외국인 누적 순매수
    pub foreigner_accum: i64,
    pub created_at: DateTime<Utc>,
}

/// 거래 기록 생성 요청.
///
/// 외부 데이터 소스가 반환하는 행도 같은 타입을 사용합니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTradingRecord {
    pub stock_code: String,
    pub trade_date: NaiveDate,
    #[serde(default)]
    pub open_price: Option<i64>,
    #[serde(default)]
    pub high_price: Option<i64>,
    #[serde(default)]
    pub low_price: Option<i64>,
    #[serde(default)]
    pub close_price: i64,
    #[serde(default)]
    pub volume: i64,
    #[serde(default)]
    pub institution_net_buy: i64,
    #[serde(default)]
    pub foreigner_net_buy: i64,
    #[serde(default)]
    pub institution_accum: i64,
    #[serde(default)]
    pub foreigner_accum: i64,
}

impl NewTradingRecord {
    pub fn new(stock_code: impl Into<String>, trade_date: NaiveDate) -> Self {
        Self {
            stock_code: stock_code.into(),
            trade_date,
            open_price: None,
            high_price: None,
            low_price: None,
            close_price: 0,
            volume: 0,
            institution_net_buy: 0,
            foreigner_net_buy: 0,
            institution_accum: 0,
            foreigner_accum: 0,
        }
    }

    pub fn with_close(mut self, close_price: i64, volume: i64) -> Self {
        self.close_price = close_price;
        self.volume = volume;
        self
    }

    pub fn with_ohlc(mut self, open: i64, high: i64, low: i64, close: i64) -> Self {
        self.open_price = Some(open);
        self.high_price = Some(high);
        self.low_price = Some(low);
        self.close_price = close;
        self
    }

    pub fn with_net_buy(mut self, institution: i64, foreigner: i64) -> Self {
        self.institution_net_buy = institution;
        self.foreigner_net_buy = foreigner;
        self
    }

    /// 종목 코드 형식과 가격/거래량 비음수 조건을 검사합니다.
    pub fn check(&self) -> StockResult<()> {
        validate_stock_code(&self.stock_code)?;

        let fields = [
            ("open_price", self.open_price),
            ("high_price", self.high_price),
            ("low_price", self.low_price),
            ("close_price", Some(self.close_price)),
            ("volume", Some(self.volume)),
        ];

        let negative: Vec<&str> = fields
            .iter()
            .filter(|(_, value)| matches!(value, Some(v) if *v < 0))
            .map(|(name, _)| *name)
            .collect();

        if negative.is_empty() {
            Ok(())
        } else {
            Err(StockError::validation(format!(
                "Must be non-negative: {}",
                negative.join(", ")
            )))
        }
    }
}

/// 거래 기록 조회 조건.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TradingQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub limit: Option<i64>,
}
