//! 증분 수집 CLI.
//!
//! 종료 코드: 성공 0, 인자 오류 또는 실행 실패 1.

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use stock_collector::{execute, Cli, CollectorError, Command};
use stock_core::{init_logging, AppConfig, LogConfig};
use stock_data::{today_kst, Database, NaverFinanceSource, Reconciler};
use tracing::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    // .env 파일 로드 (있는 경우)
    let _ = dotenvy::dotenv();

    if let Err(e) = init_logging(LogConfig::new(cli.log_level.clone())) {
        eprintln!("Failed to initialize logging: {}", e);
        return ExitCode::FAILURE;
    }

    let command = match cli.into_command() {
        Ok(command) => command,
        Err(e) => {
            eprintln!("오류: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match run(command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "증분 수집 실패");
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Command) -> Result<(), CollectorError> {
    info!("Stock Collector 시작");

    let config = AppConfig::resolve().map_err(|e| CollectorError::Config(e.to_string()))?;

    let db = Database::connect(&config.database).await?;
    db.migrate().await?;
    info!("데이터베이스 연결 성공");

    let source = NaverFinanceSource::new(&config.collector)
        .map_err(|e| CollectorError::Config(e.to_string()))?;
    let reconciler = Reconciler::new(db.clone(), Arc::new(source));

    let result = execute(&reconciler, &command, today_kst(), &mut std::io::stdout()).await;

    db.pool().close().await;
    result
}
