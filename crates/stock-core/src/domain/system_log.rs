//! 시스템 운영 로그.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 로그 심각도.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
#[cfg_attr(feature = "sqlx-support", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx-support", sqlx(rename_all = "UPPERCASE"))]
pub enum LogLevel {
    Info,
    Warning,
    Error,
}

/// 로그 분류.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
#[cfg_attr(feature = "sqlx-support", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx-support", sqlx(rename_all = "UPPERCASE"))]
pub enum LogCategory {
    Api,
    Database,
    Collector,
}

/// 저장된 시스템 로그.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx-support", derive(sqlx::FromRow))]
pub struct SystemLog {
    pub id: i64,
    pub level: LogLevel,
    pub category: LogCategory,
    pub message: String,
    /// JSON 문자열
    pub details: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// 새 시스템 로그.
#[derive(Debug, Clone, PartialEq)]
pub struct NewSystemLog {
    pub level: LogLevel,
    pub category: LogCategory,
    pub message: String,
    pub details: Option<serde_json::Value>,
}

impl NewSystemLog {
    pub fn new(level: LogLevel, category: LogCategory, message: impl Into<String>) -> Self {
        Self {
            level,
            category,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}

/// 시스템 로그 조회 조건.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SystemLogQuery {
    pub category: Option<LogCategory>,
    pub level: Option<LogLevel>,
    pub limit: Option<i64>,
}
