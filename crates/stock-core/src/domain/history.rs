//! 데이터 변경 이력.
//!
//! 서비스 계층의 변경 작업과 같은 트랜잭션에서 추가되며, 수정/삭제되지 않습니다.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 변경 종류.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
#[cfg_attr(feature = "sqlx-support", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx-support", sqlx(rename_all = "UPPERCASE"))]
pub enum HistoryAction {
    Create,
    Update,
    Delete,
}

impl HistoryAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "CREATE",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
        }
    }
}

impl std::fmt::Display for HistoryAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for HistoryAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "CREATE" => Ok(Self::Create),
            "UPDATE" => Ok(Self::Update),
            "DELETE" => Ok(Self::Delete),
            _ => Err(format!("Unknown history action: {}", s)),
        }
    }
}

/// 저장된 변경 이력.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx-support", derive(sqlx::FromRow))]
pub struct DataHistory {
    pub id: i64,
    pub action: HistoryAction,
    pub table_name: String,
    pub record_id: i64,
    pub field_name: Option<String>,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// 새 변경 이력.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewHistoryEntry {
    pub action: HistoryAction,
    pub table_name: &'static str,
    pub record_id: i64,
    pub field_name: Option<String>,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
    pub description: Option<String>,
}

impl NewHistoryEntry {
    pub fn new(action: HistoryAction, table_name: &'static str, record_id: i64) -> Self {
        Self {
            action,
            table_name,
            record_id,
            field_name: None,
            old_value: None,
            new_value: None,
            description: None,
        }
    }

    pub fn field(
        mut self,
        name: impl Into<String>,
        old_value: Option<String>,
        new_value: Option<String>,
    ) -> Self {
        self.field_name = Some(name.into());
        self.old_value = old_value;
        self.new_value = new_value;
        self
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// 이력 조회 조건.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct HistoryQuery {
    pub table_name: Option<String>,
    pub action: Option<HistoryAction>,
    pub record_id: Option<i64>,
    pub limit: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_roundtrip_text() {
        assert_eq!("update".parse::<HistoryAction>().unwrap(), HistoryAction::Update);
        assert_eq!(HistoryAction::Delete.to_string(), "DELETE");
        assert_eq!(
            serde_json::to_string(&HistoryAction::Create).unwrap(),
            "\"CREATE\""
        );
        assert!("MERGE".parse::<HistoryAction>().is_err());
    }
}
