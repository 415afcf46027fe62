//! 종목 모델.
//!
//! - `Stock` - 저장된 종목
//! - `NewStock` - 생성 요청
//! - `StockUpdate` - 부분 수정 요청
//! - `StockStats` - 시장별 종목 수 통계

use crate::error::{StockError, StockResult};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

/// 종목 코드 길이 (KRX 6자리 숫자)
pub const STOCK_CODE_LEN: usize = 6;

/// 종목 코드가 6자리 ASCII 숫자인지 확인합니다.
pub fn is_valid_stock_code(code: &str) -> bool {
    code.len() == STOCK_CODE_LEN && code.bytes().all(|b| b.is_ascii_digit())
}

/// 종목 코드 검증. 실패 시 `Validation` 에러를 반환합니다.
pub fn validate_stock_code(code: &str) -> StockResult<()> {
    if is_valid_stock_code(code) {
        Ok(())
    } else {
        Err(StockError::validation(format!(
            "Invalid stock code '{}': must be 6 digits",
            code
        )))
    }
}

fn stock_code_format(code: &str) -> Result<(), ValidationError> {
    if is_valid_stock_code(code) {
        Ok(())
    } else {
        Err(ValidationError::new("stock_code")
            .with_message(format!("Invalid stock code '{}': must be 6 digits", code).into()))
    }
}

/// 저장된 종목.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx-support", derive(sqlx::FromRow))]
pub struct Stock {
    pub id: i64,
    /// 6자리 종목 코드 (생성 후 변경 불가)
    pub stock_code: String,
    pub stock_name: String,
    /// 시장 구분 (KOSPI, KOSDAQ, KONEX)
    pub market: Option<String>,
    pub sector: Option<String>,
    /// 상장/기준일
    pub init_date: Option<NaiveDate>,
    /// 기관 누적 순매수 기준값
    pub institution_accum_init: i64,
    /// 외국인 누적 순매수 기준값
    pub foreigner_accum_init: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl std::fmt::Display for Stock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.stock_code, self.stock_name)
    }
}

/// 종목 생성 요청.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct NewStock {
    #[validate(custom(function = "stock_code_format"))]
    pub stock_code: String,
    #[validate(length(min = 1, max = 100, message = "stock_name must be 1-100 characters"))]
    pub stock_name: String,
    #[serde(default)]
    pub market: Option<String>,
    #[serde(default)]
    pub sector: Option<String>,
    #[serde(default)]
    pub init_date: Option<NaiveDate>,
    #[serde(default)]
    pub institution_accum_init: i64,
    #[serde(default)]
    pub foreigner_accum_init: i64,
}

impl NewStock {
    pub fn new(stock_code: impl Into<String>, stock_name: impl Into<String>) -> Self {
        Self {
            stock_code: stock_code.into(),
            stock_name: stock_name.into(),
            market: None,
            sector: None,
            init_date: None,
            institution_accum_init: 0,
            foreigner_accum_init: 0,
        }
    }

    pub fn with_market(mut self, market: impl Into<String>) -> Self {
        self.market = Some(market.into());
        self
    }

    pub fn with_sector(mut self, sector: impl Into<String>) -> Self {
        self.sector = Some(sector.into());
        self
    }

    pub fn with_init_date(mut self, date: NaiveDate) -> Self {
        self.init_date = Some(date);
        self
    }

    /// 필드 검증 후 `Validation` 에러로 변환합니다.
    pub fn check(&self) -> StockResult<()> {
        self.validate().map_err(StockError::from)
    }
}

/// 종목 부분 수정 요청.
///
/// `None`인 필드는 변경하지 않습니다. `stock_code`는 기존 값과 같을 때만 허용됩니다.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct StockUpdate {
    #[serde(default)]
    pub stock_code: Option<String>,
    #[serde(default)]
    #[validate(length(min = 1, max = 100, message = "stock_name must be 1-100 characters"))]
    pub stock_name: Option<String>,
    #[serde(default)]
    pub market: Option<String>,
    #[serde(default)]
    pub sector: Option<String>,
    #[serde(default)]
    pub init_date: Option<NaiveDate>,
    #[serde(default)]
    pub institution_accum_init: Option<i64>,
    #[serde(default)]
    pub foreigner_accum_init: Option<i64>,
}

impl StockUpdate {
    pub fn name(stock_name: impl Into<String>) -> Self {
        Self {
            stock_name: Some(stock_name.into()),
            ..Default::default()
        }
    }

    pub fn check(&self) -> StockResult<()> {
        self.validate().map_err(StockError::from)
    }

    /// 현재 종목과 비교해 실제로 바뀌는 필드를 `(필드명, 이전 값, 새 값)`으로 반환합니다.
    pub fn changes(&self, current: &Stock) -> Vec<FieldChange> {
        let mut changes = Vec::new();

        fn push<T: PartialEq + ToString>(
            changes: &mut Vec<FieldChange>,
            field: &'static str,
            old: Option<&T>,
            new: Option<&T>,
        ) {
            if let Some(new) = new {
                if old != Some(new) {
                    changes.push(FieldChange {
                        field,
                        old_value: old.map(ToString::to_string),
                        new_value: Some(new.to_string()),
                    });
                }
            }
        }

        push(&mut changes, "stock_name", Some(&current.stock_name), self.stock_name.as_ref());
        push(&mut changes, "market", current.market.as_ref(), self.market.as_ref());
        push(&mut changes, "sector", current.sector.as_ref(), self.sector.as_ref());
        push(&mut changes, "init_date", current.init_date.as_ref(), self.init_date.as_ref());
        push(
            &mut changes,
            "institution_accum_init",
            Some(&current.institution_accum_init),
            self.institution_accum_init.as_ref(),
        );
        push(
            &mut changes,
            "foreigner_accum_init",
            Some(&current.foreigner_accum_init),
            self.foreigner_accum_init.as_ref(),
        );

        changes
    }
}

/// 변경된 단일 필드.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldChange {
    pub field: &'static str,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
}

/// 시장별 종목 수.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx-support", derive(sqlx::FromRow))]
pub struct MarketCount {
    /// 시장 구분. 미지정 종목은 `"UNKNOWN"`
    pub market: String,
    pub count: i64,
}

/// 종목 통계.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockStats {
    pub total_stocks: i64,
    pub by_market: Vec<MarketCount>,
    pub generated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_stock() -> Stock {
        let now = Utc::now();
        Stock {
            id: 1,
            stock_code: "005930".to_string(),
            stock_name: "삼성전자".to_string(),
            market: Some("KOSPI".to_string()),
            sector: None,
            init_date: NaiveDate::from_ymd_opt(1983, 1, 1),
            institution_accum_init: 0,
            foreigner_accum_init: 0,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_stock_code_format() {
        assert!(is_valid_stock_code("005930"));
        assert!(!is_valid_stock_code("05930"));
        assert!(!is_valid_stock_code("0059301"));
        assert!(!is_valid_stock_code("00593A"));
        assert!(!is_valid_stock_code("０05930"));
        assert!(validate_stock_code("abc").unwrap_err().is_client_error());
    }

    #[test]
    fn test_new_stock_validation() {
        assert!(NewStock::new("000660", "SK하이닉스").check().is_ok());

        let err = NewStock::new("12345", "짧은코드").check().unwrap_err();
        assert!(err.message().contains("must be 6 digits"));

        let err = NewStock::new("123456", "").check().unwrap_err();
        assert!(err.message().contains("stock_name"));
    }

    #[test]
    fn test_update_changes_only_reports_differences() {
        let stock = sample_stock();
        let update = StockUpdate {
            stock_name: Some("삼성전자".to_string()),
            market: Some("KOSDAQ".to_string()),
            sector: Some("반도체".to_string()),
            institution_accum_init: Some(10),
            ..Default::default()
        };

        let changes = update.changes(&stock);
        let fields: Vec<_> = changes.iter().map(|c| c.field).collect();
        assert_eq!(fields, vec!["market", "sector", "institution_accum_init"]);

        assert_eq!(changes[0].old_value.as_deref(), Some("KOSPI"));
        assert_eq!(changes[0].new_value.as_deref(), Some("KOSDAQ"));
        assert_eq!(changes[1].old_value, None);
    }

    #[test]
    fn test_display() {
        assert_eq!(sample_stock().to_string(), "005930 삼성전자");
    }
}
