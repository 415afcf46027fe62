//! 증분 거래 데이터 수집기.
//!
//! API 서버와 독립적으로 실행되는 CLI 바이너리를 제공합니다:
//! - 종목별 빠진 거래일 확인 (`--check`)
//! - 단일/전체 종목 증분 수집 (`--force`, `--dry-run`)

pub mod cli;
pub mod error;
pub mod report;

use std::io::Write;

use chrono::NaiveDate;
use stock_data::Reconciler;
use tracing::info;

pub use cli::{Cli, Command};
pub use error::{CollectorError, Result};

/// 명령을 실행하고 결과를 `out`에 출력합니다.
///
/// 종목 단위 실패는 보고서에만 기록되므로 실행 자체는 성공으로 봅니다.
/// 옵션 검증, 알 수 없는 종목, 저장소 에러는 `Err`로 반환됩니다.
pub async fn execute(
    reconciler: &Reconciler,
    command: &Command,
    today: NaiveDate,
    out: &mut impl Write,
) -> Result<()> {
    match command {
        Command::Check {
            stock_code,
            days_back,
        } => {
            let report = reconciler
                .check_missing_dates(stock_code, *days_back, today)
                .await?;
            info!(
                stock_code = %stock_code,
                missing = report.missing_dates.len(),
                "누락 데이터 확인 완료"
            );
            report::write_check(out, &report)?;
        }
        Command::Sync { target, options } => {
            info!(?target, days_back = options.days_back, force = options.force, "증분 수집 시작");
            let report = reconciler.run(target, options, today).await?;
            report::write_sync(out, &report)?;
        }
    }
    Ok(())
}
