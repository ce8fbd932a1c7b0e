use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::collections::HashMap;

use crate::types::strategy::STRATEGY_SECTIONS;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
pub struct HtmlArtifact {
    pub client_id: i32,
    pub blog_idea_id: i32,
    pub version_number: i32,
    pub html: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
pub struct StrategyVersion {
    pub version_number: i32,
    pub created_at: Option<NaiveDateTime>,
    pub updated_at: Option<NaiveDateTime>,
}

/// A strategy row with its section columns keyed by section key.
#[derive(Debug, Clone, PartialEq)]
pub struct DbStrategy {
    pub client_id: i32,
    pub version_number: i32,
    pub created_at: Option<NaiveDateTime>,
    pub updated_at: Option<NaiveDateTime>,
    pub sections: HashMap<&'static str, Option<String>>,
}

impl DbStrategy {
    pub fn section(&self, key: &str) -> Option<&str> {
        self.sections.get(key).and_then(|c| c.as_deref())
    }

    /// Blank strategy, as created without a source version.
    pub fn blank(client_id: i32, version_number: i32) -> Self {
        Self {
            client_id,
            version_number,
            created_at: None,
            updated_at: None,
            sections: STRATEGY_SECTIONS.iter().map(|s| (s.key, None)).collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UpsertAction {
    Created,
    Updated,
}

impl UpsertAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Updated => "updated",
        }
    }
}
