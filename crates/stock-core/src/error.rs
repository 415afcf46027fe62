//! 주식 원장 시스템의 에러 타입.
//!
//! 모든 도메인 에러는 하나의 [`StockError`] 열거형으로 표현되며,
//! HTTP 경계에서는 variant 태그([`ErrorKind`])로 응답 코드를 결정합니다.

use serde::Serialize;
use thiserror::Error;

/// 도메인 에러.
///
/// 각 variant는 사람이 읽을 수 있는 메시지만 담습니다.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StockError {
    /// 입력 검증 실패 (클라이언트 원인)
    #[error("{0}")]
    Validation(String),

    /// 외부 데이터 수집 실패
    #[error("데이터 수집 에러: {0}")]
    DataCollection(String),

    /// 데이터베이스 에러
    #[error("데이터베이스 에러: {0}")]
    Database(String),

    /// 거래 데이터 처리 에러
    #[error("거래 에러: {0}")]
    Trading(String),

    /// 사용자/대상 관련 에러
    #[error("사용자 에러: {0}")]
    User(String),
}

/// 에러 분류 태그.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    DataCollection,
    Database,
    Trading,
    User,
}

impl ErrorKind {
    /// 로그/응답용 문자열.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::DataCollection => "data_collection",
            Self::Database => "database",
            Self::Trading => "trading",
            Self::User => "user",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 도메인 작업을 위한 Result 타입.
pub type StockResult<T> = Result<T, StockError>;

impl StockError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn data_collection(message: impl Into<String>) -> Self {
        Self::DataCollection(message.into())
    }

    pub fn database(message: impl Into<String>) -> Self {
        Self::Database(message.into())
    }

    pub fn trading(message: impl Into<String>) -> Self {
        Self::Trading(message.into())
    }

    pub fn user(message: impl Into<String>) -> Self {
        Self::User(message.into())
    }

    /// 에러 분류 태그를 반환합니다.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::DataCollection(_) => ErrorKind::DataCollection,
            Self::Database(_) => ErrorKind::Database,
            Self::Trading(_) => ErrorKind::Trading,
            Self::User(_) => ErrorKind::User,
        }
    }

    /// variant와 무관하게 원본 메시지를 반환합니다.
    pub fn message(&self) -> &str {
        match self {
            Self::Validation(m)
            | Self::DataCollection(m)
            | Self::Database(m)
            | Self::Trading(m)
            | Self::User(m) => m,
        }
    }

    /// 클라이언트 원인의 에러(400 계열)인지 확인합니다.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

impl From<serde_json::Error> for StockError {
    fn from(err: serde_json::Error) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<validator::ValidationErrors> for StockError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut messages: Vec<String> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |e| {
                    e.message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("{}: 유효하지 않은 값", field))
                })
            })
            .collect();
        messages.sort();
        Self::Validation(messages.join("; "))
    }
}

#[cfg(feature = "sqlx-support")]
impl From<sqlx::Error> for StockError {
    fn from(err: sqlx::Error) -> Self {
        Self::Database(err.to_string())
    }
}

#[cfg(feature = "sqlx-support")]
impl From<sqlx::migrate::MigrateError> for StockError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        Self::Database(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_dispatch() {
        assert_eq!(StockError::validation("x").kind(), ErrorKind::Validation);
        assert_eq!(
            StockError::data_collection("x").kind(),
            ErrorKind::DataCollection
        );
        assert_eq!(StockError::database("x").kind(), ErrorKind::Database);
        assert_eq!(StockError::trading("x").kind(), ErrorKind::Trading);
        assert_eq!(StockError::user("x").kind(), ErrorKind::User);
    }

    #[test]
    fn test_only_validation_is_client_error() {
        assert!(StockError::validation("bad").is_client_error());
        assert!(!StockError::database("down").is_client_error());
        assert!(!StockError::user("missing").is_client_error());
    }

    #[test]
    fn test_message_is_preserved() {
        let err = StockError::trading("가격이 음수입니다");
        assert_eq!(err.message(), "가격이 음수입니다");
        assert_eq!(err.to_string(), "거래 에러: 가격이 음수입니다");

        // Validation은 메시지를 그대로 노출
        let err = StockError::validation("Invalid JSON data");
        assert_eq!(err.to_string(), "Invalid JSON data");
    }

    #[test]
    fn test_from_serde_json_error() {
        let err: StockError = serde_json::from_str::<serde_json::Value>("{oops")
            .unwrap_err()
            .into();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }
}
