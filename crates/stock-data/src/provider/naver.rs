//! 네이버 금융 크롤러.
//!
//! 국내(KR) 주식의 투자자별 일별 매매 동향을 네이버 금융에서 수집합니다.
//!
//! ## 데이터 소스
//! - `/item/frgn.naver?code=&page=`: 날짜, 종가, 전일비, 등락률, 거래량,
//!   기관 순매매량, 외국인 순매매량, 외국인 보유주수, 보유율
//!
//! ## 사용 예시
//! ```rust,ignore
//! let source = NaverFinanceSource::new(&CollectorConfig::default())?;
//! let rows = source.fetch_daily("005930", 5).await?;
//! ```

use super::TradingDataSource;
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use scraper::{Html, Selector};
use std::collections::BTreeMap;
use std::time::Duration;
use stock_core::{CollectorConfig, NewTradingRecord, StockError, StockResult};
use thiserror::Error;
use tracing::{debug, warn};

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// 네이버 금융 크롤러 에러
#[derive(Debug, Error)]
pub enum NaverError {
    #[error("HTTP 요청 실패: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("HTTP 상태 코드 {status}: {url}")]
    Status { status: u16, url: String },

    #[error("HTML 파싱 실패: {0}")]
    ParseError(String),

    #[error("Rate limit 초과")]
    RateLimited,
}

impl From<NaverError> for StockError {
    fn from(err: NaverError) -> Self {
        StockError::data_collection(err.to_string())
    }
}

/// 네이버 금융 투자자별 매매 동향 크롤러.
pub struct NaverFinanceSource {
    client: Client,
    base_url: String,
    /// 페이지 요청 간 딜레이
    request_delay: Duration,
}

impl NaverFinanceSource {
    /// 설정으로 생성
    pub fn new(config: &CollectorConfig) -> StockResult<Self> {
        let client = Client::builder()
            .timeout(config.http_timeout())
            .user_agent(USER_AGENT)
            .build()
            .map_err(NaverError::from)?;

        Ok(Self {
            client,
            base_url: config.naver_base_url.trim_end_matches('/').to_string(),
            request_delay: config.request_delay(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// 한 페이지를 가져와 파싱합니다.
    async fn fetch_page(
        &self,
        stock_code: &str,
        page: u32,
    ) -> Result<Vec<NewTradingRecord>, NaverError> {
        let url = format!("{}/item/frgn.naver", self.base_url);

        let response = self
            .client
            .get(&url)
            .query(&[("code", stock_code), ("page", &page.to_string())])
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(NaverError::RateLimited);
        }
        if !status.is_success() {
            return Err(NaverError::Status {
                status: status.as_u16(),
                url,
            });
        }

        let html = response.text().await?;
        parse_investor_table(stock_code, &html)
    }
}

#[async_trait]
impl TradingDataSource for NaverFinanceSource {
    fn name(&self) -> &str {
        "naver"
    }

    async fn fetch_daily(
        &self,
        stock_code: &str,
        max_pages: u32,
    ) -> StockResult<Vec<NewTradingRecord>> {
        let mut rows: BTreeMap<NaiveDate, NewTradingRecord> = BTreeMap::new();

        for page in 1..=max_pages.max(1) {
            if page > 1 {
                tokio::time::sleep(self.request_delay).await;
            }

            let page_rows = self.fetch_page(stock_code, page).await?;
            let before = rows.len();
            for row in page_rows {
                rows.entry(row.trade_date).or_insert(row);
            }

            debug!(stock_code, page, total = rows.len(), "네이버 페이지 수집");

            // 마지막 페이지를 넘으면 네이버는 같은 페이지를 반복하므로 새 날짜가 없으면 종료
            if rows.len() == before {
                break;
            }
        }

        if rows.is_empty() {
            warn!(stock_code, "네이버에서 거래 데이터를 찾지 못함");
        }

        Ok(rows.into_values().rev().collect())
    }
}

/// 투자자별 매매 동향 표 파싱.
///
/// 첫 칸이 `YYYY.MM.DD` 형식인 행만 데이터 행으로 취급합니다.
pub fn parse_investor_table(
    stock_code: &str,
    html: &str,
) -> Result<Vec<NewTradingRecord>, NaverError> {
    let document = Html::parse_document(html);
    let row_selector =
        Selector::parse("table.type2 tr").map_err(|e| NaverError::ParseError(e.to_string()))?;
    let cell_selector =
        Selector::parse("td").map_err(|e| NaverError::ParseError(e.to_string()))?;

    let mut records = Vec::new();

    for tr in document.select(&row_selector) {
        let cells: Vec<String> = tr
            .select(&cell_selector)
            .map(|td| td.text().collect::<String>().trim().to_string())
            .collect();

        if cells.len() < 7 {
            continue;
        }

        let Ok(trade_date) = NaiveDate::parse_from_str(&cells[0], "%Y.%m.%d") else {
            continue;
        };

        let (Some(close_price), Some(volume)) = (parse_number(&cells[1]), parse_number(&cells[4]))
        else {
            return Err(NaverError::ParseError(format!(
                "{} {}: 종가/거래량 파싱 실패",
                stock_code, cells[0]
            )));
        };

        let mut record = NewTradingRecord::new(stock_code, trade_date).with_close(close_price, volume);
        record.institution_net_buy = parse_number(&cells[5]).unwrap_or(0);
        record.foreigner_net_buy = parse_number(&cells[6]).unwrap_or(0);

        records.push(record);
    }

    Ok(records)
}

/// 부호/쉼표가 포함된 정수 파싱
///
/// "+1,234" -> 1234, "-5,678" -> -5678, "" -> None
fn parse_number(text: &str) -> Option<i64> {
    let negative = text.trim_start().starts_with('-');
    let digits: String = text.chars().filter(|c| c.is_ascii_digit()).collect();

    if digits.is_empty() {
        return None;
    }

    let value: i64 = digits.parse().ok()?;
    Some(if negative { -value } else { value })
}
