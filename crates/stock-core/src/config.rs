//! 설정 관리.
//!
//! 두 가지 로드 경로를 제공합니다.
//! - [`AppConfig::from_env`]: `.env`와 환경 변수만 사용 (바이너리 기본 경로)
//! - [`AppConfig::load`]: TOML 파일 위에 `STOCK__` 접두사 환경 변수를 덮어씀
//!
//! 바이너리는 [`AppConfig::resolve`]로 둘 중 하나를 고릅니다 (`CONFIG_PATH`).

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// 애플리케이션 설정.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub cache: CacheConfig,
    pub collector: CollectorConfig,
}

/// 서버 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// 요청 타임아웃 (초)
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            request_timeout_secs: 30,
        }
    }
}

impl ServerConfig {
    /// `host:port` 소켓 주소
    pub fn socket_addr(&self) -> Result<std::net::SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// 데이터베이스 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite 연결 URL (예: `sqlite://stock.db`, `sqlite::memory:`)
    pub url: String,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://stock.db".to_string(),
            max_connections: 5,
        }
    }
}

/// 로깅 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// 로그 형식 (pretty, json, compact)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl LoggingConfig {
    /// [`crate::logging::LogConfig`]로 변환합니다. 알 수 없는 형식은 pretty로 처리합니다.
    pub fn to_log_config(&self) -> crate::logging::LogConfig {
        crate::logging::LogConfig::new(self.level.clone())
            .with_format(self.format.parse().unwrap_or_default())
    }
}

/// 캐시 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    /// 종목 통계 캐시 TTL (초)
    pub stats_ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { stats_ttl_secs: 300 }
    }
}

impl CacheConfig {
    pub fn stats_ttl(&self) -> Duration {
        Duration::from_secs(self.stats_ttl_secs)
    }
}

/// 외부 데이터 수집 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CollectorConfig {
    /// 네이버 금융 기본 URL
    pub naver_base_url: String,
    /// 페이지 요청 간 딜레이 (밀리초)
    pub request_delay_ms: u64,
    /// HTTP 클라이언트 타임아웃 (초)
    pub http_timeout_secs: u64,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            naver_base_url: "https://finance.naver.com".to_string(),
            request_delay_ms: 300,
            http_timeout_secs: 30,
        }
    }
}

impl CollectorConfig {
    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

impl AppConfig {
    /// 환경변수에서 설정 로드
    ///
    /// `.env` 파일이 있으면 먼저 읽습니다. 파싱에 실패한 값은 기본값을 사용합니다.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let defaults = Self::default();

        Self {
            server: ServerConfig {
                host: env_var_parse("API_HOST", defaults.server.host),
                port: env_var_parse("API_PORT", defaults.server.port),
                request_timeout_secs: env_var_parse(
                    "API_REQUEST_TIMEOUT_SECS",
                    defaults.server.request_timeout_secs,
                ),
            },
            database: DatabaseConfig {
                url: env_var_parse("DATABASE_URL", defaults.database.url),
                max_connections: env_var_parse(
                    "DATABASE_MAX_CONNECTIONS",
                    defaults.database.max_connections,
                ),
            },
            logging: LoggingConfig {
                level: env_var_parse("RUST_LOG", defaults.logging.level),
                format: env_var_parse("LOG_FORMAT", defaults.logging.format),
            },
            cache: CacheConfig {
                stats_ttl_secs: env_var_parse("STATS_CACHE_TTL_SECS", defaults.cache.stats_ttl_secs),
            },
            collector: CollectorConfig {
                naver_base_url: env_var_parse("NAVER_BASE_URL", defaults.collector.naver_base_url),
                request_delay_ms: env_var_parse(
                    "NAVER_REQUEST_DELAY_MS",
                    defaults.collector.request_delay_ms,
                ),
                http_timeout_secs: env_var_parse(
                    "HTTP_TIMEOUT_SECS",
                    defaults.collector.http_timeout_secs,
                ),
            },
        }
    }

    /// 파일과 환경 변수에서 설정을 로드합니다.
    ///
    /// 환경 변수는 `STOCK__DATABASE__URL` 형식으로 파일 값을 덮어씁니다.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder()
            .add_source(config::File::from(path.as_ref()).required(false))
            .add_source(
                config::Environment::with_prefix("STOCK")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            );

        builder.build()?.try_deserialize()
    }

    /// `CONFIG_PATH`가 있으면 해당 파일로 [`AppConfig::load`], 없으면 [`AppConfig::from_env`].
    pub fn resolve() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();
        match std::env::var("CONFIG_PATH") {
            Ok(path) => Self::load(path),
            Err(_) => Ok(Self::from_env()),
        }
    }
}

/// 환경변수에서 값을 파싱 (실패 시 기본값 사용)
fn env_var_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.cache.stats_ttl(), Duration::from_secs(300));
        assert_eq!(config.collector.http_timeout(), Duration::from_secs(30));
        assert_eq!(config.collector.naver_base_url, "https://finance.naver.com");
        assert_eq!(
            config.server.socket_addr().unwrap(),
            "127.0.0.1:5000".parse().unwrap()
        );
    }

    #[test]
    fn test_env_var_parse_falls_back_on_garbage() {
        std::env::set_var("STOCK_CORE_TEST_PORT", "not-a-number");
        assert_eq!(env_var_parse("STOCK_CORE_TEST_PORT", 42u16), 42);
        std::env::set_var("STOCK_CORE_TEST_PORT", "8080");
        assert_eq!(env_var_parse("STOCK_CORE_TEST_PORT", 42u16), 8080);
        std::env::remove_var("STOCK_CORE_TEST_PORT");
    }

    #[test]
    fn test_load_partial_toml() {
        let path = std::env::temp_dir().join("stock_core_config_test.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "[server]\nport = 9100\n\n[cache]\nstats_ttl_secs = 5").unwrap();

        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config.server.port, 9100);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.cache.stats_ttl_secs, 5);
        assert_eq!(config.database.max_connections, 5);

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_resolve_uses_config_path() {
        let path = std::env::temp_dir().join("stock_core_resolve_test.toml");
        std::fs::write(&path, "[database]\nurl = \"sqlite::memory:\"\n").unwrap();

        std::env::set_var("CONFIG_PATH", &path);
        let config = AppConfig::resolve().unwrap();
        std::env::remove_var("CONFIG_PATH");

        assert_eq!(config.database.url, "sqlite::memory:");
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_logging_config_conversion() {
        let logging = LoggingConfig {
            level: "debug".to_string(),
            format: "json".to_string(),
        };
        let log_config = logging.to_log_config();
        assert_eq!(log_config.level, "debug");
        assert_eq!(log_config.format, crate::logging::LogFormat::Json);
    }
}
