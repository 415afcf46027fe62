//! tracing을 사용한 로깅 인프라.
//!
//! API 서버와 수집기 CLI가 같은 초기화 경로를 사용합니다.
//! - **pretty**: 개발용
//! - **json**: 운영환경/로그 집계용
//! - **compact**: 한 줄 형식

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// 로그 출력 형식.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
    Compact,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            "compact" => Ok(Self::Compact),
            _ => Err(format!("Unknown log format: {}", s)),
        }
    }
}

/// 로깅 설정.
#[derive(Debug, Clone, Default)]
pub struct LogConfig {
    /// 로그 레벨 필터 (예: "info", "stock_data=debug"). 비어 있으면 info
    pub level: String,
    pub format: LogFormat,
}

impl LogConfig {
    pub fn new(level: impl Into<String>) -> Self {
        Self {
            level: level.into(),
            ..Default::default()
        }
    }

    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    fn filter(&self) -> Result<EnvFilter, tracing_subscriber::filter::ParseError> {
        if self.level.trim().is_empty() {
            EnvFilter::try_new("info")
        } else {
            EnvFilter::try_new(&self.level)
        }
    }
}

/// 주어진 설정으로 전역 subscriber를 설치합니다.
///
/// `RUST_LOG`가 설정되어 있으면 `config.level`보다 우선합니다.
/// 이미 subscriber가 설치된 경우 에러를 반환합니다.
///
/// ```no_run
/// use stock_core::logging::{init_logging, LogConfig, LogFormat};
///
/// init_logging(LogConfig::new("debug").with_format(LogFormat::Json)).unwrap();
/// ```
pub fn init_logging(config: LogConfig) -> Result<(), Box<dyn std::error::Error>> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => config.filter()?,
    };

    let fmt_layer = match config.format {
        LogFormat::Pretty => fmt::layer().pretty().boxed(),
        LogFormat::Json => fmt::layer().json().boxed(),
        LogFormat::Compact => fmt::layer().compact().boxed(),
    };

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(env_filter)
        .try_init()?;

    tracing::debug!(format = ?config.format, level = %config.level, "Logging initialized");

    Ok(())
}

/// future 실행 시간을 측정해 HTTP 미들웨어와 같은 형식으로 기록합니다.
///
/// `function`, `execution_time`(초) 필드를 가진 info 로그 한 줄을 남기며,
/// 결과는 그대로 돌려줍니다.
pub async fn timed<F>(name: &str, future: F) -> F::Output
where
    F: std::future::Future,
{
    let start = tokio::time::Instant::now();
    let output = future.await;
    let execution_time = start.elapsed().as_secs_f64();

    tracing::info!(function = name, execution_time, "Function executed");

    output
}

/// 종목 코드 필드가 포함된 span을 생성합니다.
///
/// 수집기가 종목 단위 작업을 감쌀 때 사용합니다.
#[macro_export]
macro_rules! stock_span {
    ($name:expr, $stock_code:expr) => {
        tracing::info_span!($name, stock_code = %$stock_code)
    };
    ($name:expr, $stock_code:expr, $days_back:expr) => {
        tracing::info_span!($name, stock_code = %$stock_code, days_back = $days_back)
    };
}
