use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};

use crate::error::KeywordError;
use crate::router::McpState;
use crate::service::opportunities::{DEFAULT_OPPORTUNITY_LOCATION, fetch_keyword_opportunities};

fn bad_request(message: String) -> Response {
    (StatusCode::BAD_REQUEST, Json(json!({"error": message}))).into_response()
}

/// `location_code` may arrive as a number or a numeric string.
fn location_code(body: &Value) -> Result<i64, KeywordError> {
    match body.get("location_code") {
        None | Some(Value::Null) => Ok(DEFAULT_OPPORTUNITY_LOCATION),
        Some(Value::Number(n)) => n
            .as_i64()
            .ok_or_else(|| KeywordError::InvalidArguments(format!("location_code {n} is not an integer"))),
        Some(Value::String(s)) => s.trim().parse().map_err(|_| {
            KeywordError::InvalidArguments(format!("location_code '{s}' is not an integer"))
        }),
        Some(other) => Err(KeywordError::InvalidArguments(format!(
            "location_code {other} is not an integer"
        ))),
    }
}

fn domain(body: &Value) -> String {
    ["domain", "target"]
        .iter()
        .filter_map(|k| body.get(*k).and_then(Value::as_str))
        .find(|s| !s.is_empty())
        .unwrap_or_default()
        .trim()
        .to_string()
}

pub async fn keyword_opportunities_handler(
    State(state): State<McpState>,
    body: Bytes,
) -> Result<Response, KeywordError> {
    let body: Value = match serde_json::from_slice(&body) {
        Ok(v) => v,
        Err(e) => return Ok(bad_request(format!("Invalid JSON: {e}"))),
    };
    let domain = domain(&body);
    if domain.is_empty() {
        return Ok(bad_request("Missing domain or target".to_string()));
    }
    let location_code = location_code(&body)?;
    let language_code = match body.get("language_code") {
        Some(Value::String(s)) => s.clone(),
        None | Some(Value::Null) => "en".to_string(),
        Some(other) => other.to_string(),
    };

    let report =
        fetch_keyword_opportunities(&state.dataforseo, &domain, location_code, &language_code)
            .await;
    if let Some(error) = report.error.as_ref()
        && report.opportunities.is_empty()
    {
        return Ok((StatusCode::BAD_GATEWAY, Json(json!({"error": error}))).into_response());
    }
    Ok(Json(report).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_prefers_domain_then_target() {
        assert_eq!(domain(&json!({"domain": " setsail.ca ", "target": "x.com"})), "setsail.ca");
        assert_eq!(domain(&json!({"domain": "", "target": "x.com"})), "x.com");
        assert_eq!(domain(&json!({"target": null})), "");
    }

    #[test]
    fn location_code_accepts_numeric_strings() {
        assert_eq!(location_code(&json!({})).unwrap(), 2124);
        assert_eq!(location_code(&json!({"location_code": 2840})).unwrap(), 2840);
        assert_eq!(location_code(&json!({"location_code": "2826"})).unwrap(), 2826);
        assert!(location_code(&json!({"location_code": "ca"})).is_err());
    }
}
