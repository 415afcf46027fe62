//! 사람이 읽는 실행 결과 출력.

use std::io::{self, Write};

use chrono::NaiveDate;
use stock_data::{MissingDatesReport, StockOutcome, SyncReport};

/// 확인 결과에 표시할 최대 날짜 수
const MISSING_DATES_PREVIEW: usize = 10;

/// `--check` 결과를 출력합니다.
pub fn write_check(out: &mut impl Write, report: &MissingDatesReport) -> io::Result<()> {
    let latest = report
        .latest_date
        .map(|d| d.to_string())
        .unwrap_or_else(|| "없음".to_string());

    writeln!(out, "=== 누락 데이터 확인 결과 ===")?;
    writeln!(out, "주식: {} - {}", report.stock.stock_code, report.stock.stock_name)?;
    writeln!(out, "최신 데이터 날짜: {}", latest)?;
    writeln!(
        out,
        "확인 기간: {} ~ {} (거래일 {}일)",
        report.window_start, report.window_end, report.candidate_days
    )?;
    writeln!(out, "누락된 날짜 수: {}개", report.missing_dates.len())?;
    writeln!(out, "누락된 날짜들: {}", preview(&report.missing_dates))?;
    Ok(())
}

fn preview(dates: &[NaiveDate]) -> String {
    let shown: Vec<String> = dates
        .iter()
        .take(MISSING_DATES_PREVIEW)
        .map(|d| d.to_string())
        .collect();
    let mut line = format!("[{}]", shown.join(", "));
    if dates.len() > MISSING_DATES_PREVIEW {
        line.push_str("...");
    }
    line
}

/// 동기화 결과를 출력합니다. dry-run은 누락 목록만 출력합니다.
pub fn write_sync(out: &mut impl Write, report: &SyncReport) -> io::Result<()> {
    if report.dry_run {
        return write_plan(out, report);
    }

    writeln!(out, "=== 증분 크롤링 완료 ===")?;
    writeln!(out, "대상 주식: {}개", report.total_stocks)?;
    writeln!(out, "수집 완료: {}개", report.collected_stocks)?;
    writeln!(out, "건너뛰기: {}개", report.skipped_stocks)?;
    writeln!(out, "실패: {}개", report.failed_stocks)?;
    writeln!(out, "총 누락 날짜: {}개", report.total_missing_dates)?;
    writeln!(out, "수집된 날짜: {}개", report.collected_dates)?;

    if !report.is_success() {
        writeln!(out)?;
        writeln!(out, "=== 실패한 주식들 ===")?;
        for detail in report.failures() {
            if let StockOutcome::Failed { reason } = &detail.outcome {
                writeln!(out, "- {} {}: {}", detail.stock_code, detail.stock_name, reason)?;
            }
        }
    }
    Ok(())
}

fn write_plan(out: &mut impl Write, report: &SyncReport) -> io::Result<()> {
    for detail in &report.details {
        if detail.missing_count > 0 {
            writeln!(
                out,
                "{} {}: {}개 누락",
                detail.stock_code, detail.stock_name, detail.missing_count
            )?;
        }
    }
    writeln!(out)?;
    writeln!(
        out,
        "총 {}개 주식에서 {}개 날짜 누락",
        report.total_stocks, report.total_missing_dates
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use stock_data::testing::{date, memory_database, samsung};
    use stock_data::StockSyncDetail;

    fn render<F>(f: F) -> String
    where
        F: FnOnce(&mut Vec<u8>) -> io::Result<()>,
    {
        let mut buf = Vec::new();
        f(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    fn detail(code: &str, missing: usize, outcome: StockOutcome) -> StockSyncDetail {
        StockSyncDetail {
            stock_code: code.to_string(),
            stock_name: format!("종목{}", code),
            latest_date: None,
            missing_count: missing,
            outcome,
        }
    }

    fn sync_report(dry_run: bool, details: Vec<StockSyncDetail>) -> SyncReport {
        let now = Utc::now();
        SyncReport {
            dry_run,
            force: false,
            days_back: 30,
            window_start: date(2024, 1, 2),
            window_end: date(2024, 1, 31),
            total_stocks: details.len(),
            collected_stocks: 1,
            skipped_stocks: 0,
            failed_stocks: details
                .iter()
                .filter(|d| matches!(d.outcome, StockOutcome::Failed { .. }))
                .count(),
            planned_stocks: 0,
            total_missing_dates: details.iter().map(|d| d.missing_count).sum(),
            collected_dates: 3,
            started_at: now,
            finished_at: now,
            details,
        }
    }

    #[tokio::test]
    async fn test_check_output_truncates_dates() {
        let db = memory_database().await;
        let missing: Vec<NaiveDate> = (2..=13).map(|d| date(2024, 1, d)).collect();
        let report = MissingDatesReport {
            stock: samsung(db.pool()).await,
            latest_date: None,
            window_start: date(2024, 1, 1),
            window_end: date(2024, 1, 31),
            candidate_days: 23,
            missing_dates: missing,
        };

        let text = render(|out| write_check(out, &report));
        assert!(text.starts_with("=== 누락 데이터 확인 결과 ===\n"));
        assert!(text.contains("주식: 005930 - 삼성전자"));
        assert!(text.contains("최신 데이터 날짜: 없음"));
        assert!(text.contains("누락된 날짜 수: 12개"));
        assert!(text.contains("2024-01-11]..."));
        assert!(!text.contains("2024-01-12"));
    }

    #[test]
    fn test_sync_output_lists_failures() {
        let report = sync_report(
            false,
            vec![
                detail("000001", 3, StockOutcome::Collected { missing_dates: 3, collected_dates: 3 }),
                detail("000002", 2, StockOutcome::Failed { reason: "timeout".to_string() }),
            ],
        );

        let text = render(|out| write_sync(out, &report));
        assert!(text.contains("대상 주식: 2개"));
        assert!(text.contains("실패: 1개"));
        assert!(text.contains("총 누락 날짜: 5개"));
        assert!(text.contains("=== 실패한 주식들 ===\n- 000002 종목000002: timeout"));
    }

    #[test]
    fn test_sync_output_without_failures() {
        let report = sync_report(
            false,
            vec![detail("000001", 0, StockOutcome::Skipped { reason: "up to date".to_string() })],
        );

        let text = render(|out| write_sync(out, &report));
        assert!(!text.contains("실패한 주식들"));
    }

    #[test]
    fn test_dry_run_lists_only_stocks_with_gaps() {
        let report = sync_report(
            true,
            vec![
                detail("000001", 4, StockOutcome::Planned { missing_dates: vec![] }),
                detail("000002", 0, StockOutcome::Planned { missing_dates: vec![] }),
            ],
        );

        let text = render(|out| write_sync(out, &report));
        assert!(text.contains("000001 종목000001: 4개 누락"));
        assert!(!text.contains("000002"));
        assert!(text.contains("총 2개 주식에서 4개 날짜 누락"));
        assert!(!text.contains("증분 크롤링 완료"));
    }
}
