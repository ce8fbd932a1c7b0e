use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::KeywordError;

/// Status code DataForSEO reports on a task that completed normally.
pub const TASK_OK: i64 = 20000;

/// Top-level DataForSEO v3 response envelope.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DataForSeoResponse {
    #[serde(default)]
    pub status_code: Option<i64>,
    #[serde(default)]
    pub status_message: Option<String>,
    #[serde(default)]
    pub tasks: Option<Vec<DataForSeoTask>>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DataForSeoTask {
    #[serde(default)]
    pub status_code: Option<i64>,
    #[serde(default)]
    pub status_message: Option<String>,
    #[serde(default)]
    pub result: Option<Vec<Value>>,
}

impl DataForSeoResponse {
    pub fn from_value(raw: &Value) -> Result<Self, KeywordError> {
        Self::deserialize(raw).map_err(|e| {
            KeywordError::UnexpectedResponse(format!(
                "Unexpected response structure from DataForSEO API: {e}. Response: {raw}"
            ))
        })
    }

    pub fn tasks(&self) -> &[DataForSeoTask] {
        self.tasks.as_deref().unwrap_or_default()
    }

    pub fn first_task(&self) -> Result<&DataForSeoTask, KeywordError> {
        self.tasks().first().ok_or_else(|| {
            KeywordError::UnexpectedResponse("No tasks in DataForSEO API response".to_string())
        })
    }
}

impl DataForSeoTask {
    pub fn results(&self) -> &[Value] {
        self.result.as_deref().unwrap_or_default()
    }

    pub fn ensure_ok(&self) -> Result<(), KeywordError> {
        if self.status_code == Some(TASK_OK) {
            return Ok(());
        }
        Err(KeywordError::DataForSeoTask {
            code: self.status_code.unwrap_or_default(),
            message: self
                .status_message
                .clone()
                .unwrap_or_else(|| "Unknown error".to_string()),
        })
    }
}

/// `value[a][b]...`, treating missing keys and `null` alike.
pub fn path<'a>(value: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .try_fold(value, |v, k| v.get(k))
        .filter(|v| !v.is_null())
}

/// Like [`path`] but yields JSON `null` when absent.
pub fn field(value: &Value, keys: &[&str]) -> Value {
    path(value, keys).cloned().unwrap_or(Value::Null)
}

/// First present and truthy field, mirroring `a or b` fallbacks on upstream payloads.
pub fn first_truthy(value: &Value, candidates: &[&[&str]]) -> Value {
    candidates
        .iter()
        .filter_map(|keys| path(value, keys))
        .find(|v| is_truthy(v))
        .cloned()
        .unwrap_or(Value::Null)
}

pub fn is_truthy(v: &Value) -> bool {
    match v {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// Items of a result entry, which DataForSEO sometimes nests under `items_data`.
pub fn result_items(result: &Value) -> &[Value] {
    let candidates = [
        path(result, &["items"]),
        path(result, &["items_data"]),
        path(result, &["items_data", "items"]),
    ];
    candidates
        .into_iter()
        .flatten()
        .filter_map(Value::as_array)
        .find(|items| !items.is_empty())
        .map(Vec::as_slice)
        .unwrap_or_default()
}
