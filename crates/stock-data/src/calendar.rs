//! 거래일 캘린더.
//!
//! 증분 수집은 조회 구간의 후보 거래일과 저장된 날짜를 비교합니다.
//! 어떤 날이 거래일인지는 [`TradingCalendar`] 구현이 결정합니다.

use chrono::{Datelike, Duration, NaiveDate, Utc, Weekday};
use chrono_tz::Asia::Seoul;
use std::collections::BTreeSet;

/// 거래일 판정.
pub trait TradingCalendar: Send + Sync {
    fn is_trading_day(&self, date: NaiveDate) -> bool;

    /// `[start, end]` 구간의 거래일 (오름차순). `start > end`이면 비어 있습니다.
    fn trading_days(&self, start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
        start
            .iter_days()
            .take_while(|d| *d <= end)
            .filter(|d| self.is_trading_day(*d))
            .collect()
    }
}

/// 월~금을 거래일로 보는 캘린더. 휴장일을 추가로 지정할 수 있습니다.
#[derive(Debug, Clone, Default)]
pub struct WeekdayCalendar {
    holidays: BTreeSet<NaiveDate>,
}

impl WeekdayCalendar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_holidays(holidays: impl IntoIterator<Item = NaiveDate>) -> Self {
        Self {
            holidays: holidays.into_iter().collect(),
        }
    }
}

impl TradingCalendar for WeekdayCalendar {
    fn is_trading_day(&self, date: NaiveDate) -> bool {
        !matches!(date.weekday(), Weekday::Sat | Weekday::Sun) && !self.holidays.contains(&date)
    }
}

/// 한국 시간(Asia/Seoul) 기준 오늘 날짜.
pub fn today_kst() -> NaiveDate {
    Utc::now().with_timezone(&Seoul).date_naive()
}

/// `today`로 끝나는 `days_back`일 구간 `[today - (days_back - 1), today]`.
///
/// `days_back`이 0 이하이면 `today` 하루로 취급합니다.
pub fn lookback_window(today: NaiveDate, days_back: i64) -> (NaiveDate, NaiveDate) {
    let span = days_back.max(1) - 1;
    (today - Duration::days(span), today)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_weekdays_only() {
        let calendar = WeekdayCalendar::new();
        // 2024-01-01(월) ~ 2024-01-07(일)
        let days = calendar.trading_days(date(2024, 1, 1), date(2024, 1, 7));
        assert_eq!(days.len(), 5);
        assert_eq!(days.first(), Some(&date(2024, 1, 1)));
        assert_eq!(days.last(), Some(&date(2024, 1, 5)));
    }

    #[test]
    fn test_holidays_excluded() {
        let calendar = WeekdayCalendar::with_holidays([date(2024, 1, 1)]);
        assert!(!calendar.is_trading_day(date(2024, 1, 1)));
        assert!(calendar.is_trading_day(date(2024, 1, 2)));
    }

    #[test]
    fn test_empty_range() {
        let calendar = WeekdayCalendar::new();
        assert!(calendar.trading_days(date(2024, 1, 5), date(2024, 1, 4)).is_empty());
    }

    #[test]
    fn test_lookback_window_is_inclusive() {
        let (start, end) = lookback_window(date(2024, 1, 30), 30);
        assert_eq!(start, date(2024, 1, 1));
        assert_eq!(end, date(2024, 1, 30));
        assert_eq!((end - start).num_days() + 1, 30);

        assert_eq!(lookback_window(date(2024, 1, 30), 1), (date(2024, 1, 30), date(2024, 1, 30)));
        assert_eq!(lookback_window(date(2024, 1, 30), 0).0, date(2024, 1, 30));
    }
}
