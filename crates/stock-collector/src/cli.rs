//! 명령줄 인자 정의 및 검증.
//!
//! ```text
//! stock-collector --stock-code 005930 --check
//! stock-collector --all --days-back 60 --dry-run
//! stock-collector --stock-code 005930 --force --max-pages 10
//! ```

use clap::{ArgGroup, Parser};
use stock_core::is_valid_stock_code;
use stock_data::{SyncOptions, SyncTarget, DAYS_BACK_RANGE, MAX_PAGES_RANGE};

use crate::error::{CollectorError, Result};

#[derive(Debug, Parser)]
#[command(name = "stock-collector")]
#[command(about = "증분 거래 데이터 수집기", long_about = None)]
#[command(version)]
#[command(group(
    ArgGroup::new("target")
        .required(true)
        .args(["stock_code", "all"])
))]
pub struct Cli {
    /// 특정 종목 코드 (6자리)
    #[arg(long)]
    pub stock_code: Option<String>,

    /// 등록된 전체 종목
    #[arg(long)]
    pub all: bool,

    /// 확인할 기간 (일, 1~365)
    #[arg(long, default_value_t = 30, allow_negative_numbers = true)]
    pub days_back: i64,

    /// 종목당 최대 페이지 수 (1~50)
    #[arg(long, default_value_t = 5, allow_negative_numbers = true)]
    pub max_pages: i64,

    /// 빠진 날짜가 없어도 수집하고 기존 기록을 덮어씀
    #[arg(long)]
    pub force: bool,

    /// 빠진 날짜만 확인 (--stock-code 필요)
    #[arg(long)]
    pub check: bool,

    /// 수집 없이 계획만 출력
    #[arg(long)]
    pub dry_run: bool,

    /// 로그 레벨 (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

/// 검증을 통과한 실행 명령.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Check { stock_code: String, days_back: i64 },
    Sync { target: SyncTarget, options: SyncOptions },
}

impl Cli {
    /// 인자 조합과 범위를 검증하고 실행 명령으로 변환합니다.
    pub fn into_command(self) -> Result<Command> {
        if let Some(code) = &self.stock_code {
            if !is_valid_stock_code(code) {
                return Err(CollectorError::invalid_args(
                    "주식 코드는 6자리 숫자여야 합니다",
                ));
            }
        }
        if !DAYS_BACK_RANGE.contains(&self.days_back) {
            return Err(CollectorError::invalid_args(
                "확인 기간은 1~365일 사이여야 합니다",
            ));
        }
        let max_pages = u32::try_from(self.max_pages)
            .ok()
            .filter(|p| MAX_PAGES_RANGE.contains(p))
            .ok_or_else(|| CollectorError::invalid_args("최대 페이지 수는 1~50 사이여야 합니다"))?;

        if self.check {
            return match self.stock_code {
                Some(stock_code) => Ok(Command::Check {
                    stock_code,
                    days_back: self.days_back,
                }),
                None => Err(CollectorError::invalid_args(
                    "--check 옵션은 특정 주식 코드와 함께 사용해야 합니다",
                )),
            };
        }

        let target = match self.stock_code {
            Some(code) => SyncTarget::Stock(code),
            None => SyncTarget::All,
        };

        Ok(Command::Sync {
            target,
            options: SyncOptions {
                days_back: self.days_back,
                max_pages,
                force: self.force,
                dry_run: self.dry_run,
            },
        })
    }
}
