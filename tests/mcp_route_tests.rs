use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use serde_json::{Value, json};
use tower::ServiceExt;

use keyword_mcp::config::Config;
use keyword_mcp::router::{McpState, mcp_router};

fn app_with(cfg: Config) -> Router {
    let state = McpState::with_client(cfg, reqwest::Client::new());
    mcp_router(state)
}

fn app() -> Router {
    app_with(Config::default())
}

fn post_json(uri: &str, body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .header("accept", "application/json, text/event-stream")
        .body(body.into())
        .expect("failed to build request")
}

async fn body_json(resp: axum::response::Response) -> Value {
    let body = to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("failed to read response body");
    serde_json::from_slice(&body).expect("response body was not JSON")
}

#[tokio::test]
async fn initialize_returns_session_header() {
    let payload = json!({
        "jsonrpc": "2.0",
        "id": 1,
        "method": "initialize",
        "params": {
            "protocolVersion": "2025-06-18",
            "capabilities": {},
            "clientInfo": {"name": "route-test", "version": "0"}
        }
    });
    let resp = app()
        .oneshot(post_json("/mcp", payload.to_string()))
        .await
        .expect("request failed");

    assert_eq!(resp.status(), StatusCode::OK);
    let session = resp
        .headers()
        .get("mcp-session-id")
        .expect("missing session header")
        .to_str()
        .expect("session header was not ascii")
        .to_string();
    assert_eq!(session.len(), 36);

    let body = body_json(resp).await;
    assert_eq!(body["id"], 1);
    assert_eq!(body["result"]["protocolVersion"], "2025-06-18");
    assert_eq!(body["result"]["serverInfo"]["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn notification_is_accepted_without_body() {
    let resp = app()
        .oneshot(post_json(
            "/mcp",
            r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
        ))
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::ACCEPTED);
    let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    assert!(body.is_empty());
}

#[tokio::test]
async fn parse_error_is_json_rpc_error() {
    let resp = app()
        .oneshot(post_json("/mcp", "{\"jsonrpc\": "))
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["error"]["code"], -32700);
    assert!(body["id"].is_null());
}

#[tokio::test]
async fn tools_list_over_http() {
    let resp = app()
        .oneshot(post_json(
            "/mcp",
            r#"{"jsonrpc":"2.0","id":"list","method":"tools/list","params":{}}"#,
        ))
        .await
        .expect("request failed");
    let body = body_json(resp).await;
    let names: Vec<&str> = body["result"]["tools"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["name"].as_str().unwrap())
        .collect();
    assert!(names.contains(&"getKeywordIdeas"));
    assert!(names.contains(&"writeHTML"));
    assert!(names.contains(&"editStrategyExecutiveSummary"));
}

#[tokio::test]
async fn get_is_not_allowed_and_delete_ends_session() {
    let resp = app()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/mcp")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(resp.headers()[header::ALLOW], "POST, DELETE");

    let resp = app()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/mcp")
                .header("mcp-session-id", "6f1c8c0e-0000-4000-8000-000000000000")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn auth_token_is_enforced_when_configured() {
    let cfg = Config {
        mcp_auth_token: Some("s3cret".to_string()),
        ..Config::default()
    };
    let app = app_with(cfg);
    let ping = r#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#;

    let resp = app
        .clone()
        .oneshot(post_json("/mcp", ping))
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(resp).await["error"], "unauthorized");

    let mut req = post_json("/mcp", ping);
    req.headers_mut()
        .insert(header::AUTHORIZATION, "Bearer s3cret".parse().unwrap());
    let resp = app.clone().oneshot(req).await.expect("request failed");
    assert_eq!(resp.status(), StatusCode::OK);

    let mut req = post_json("/mcp", ping);
    req.headers_mut()
        .insert("x-api-key", "s3cret".parse().unwrap());
    let resp = app.oneshot(req).await.expect("request failed");
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["result"], json!({}));
}

#[tokio::test]
async fn oversized_body_is_rejected() {
    let cfg = Config {
        max_body_bytes: 1024,
        ..Config::default()
    };
    let filler = "a".repeat(4096);
    let payload = format!(
        r#"{{"jsonrpc":"2.0","id":1,"method":"tools/call","params":{{"name":"writeHTML","arguments":{{"html":"{filler}"}}}}}}"#
    );
    let resp = app_with(cfg)
        .oneshot(post_json("/mcp", payload))
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn health_reports_ok() {
    let resp = app()
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await, json!({"status": "ok"}));
}

#[tokio::test]
async fn keyword_opportunities_validates_input() {
    let resp = app()
        .oneshot(post_json("/keyword-opportunities", "not json"))
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = body_json(resp).await;
    assert!(body["error"].as_str().unwrap().starts_with("Invalid JSON: "));

    let resp = app()
        .oneshot(post_json("/keyword-opportunities", r#"{"domain": "  "}"#))
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(resp).await, json!({"error": "Missing domain or target"}));

    let resp = app()
        .oneshot(post_json(
            "/keyword-opportunities",
            r#"{"domain": "setsail.ca", "location_code": "canada"}"#,
        ))
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(resp).await["error"]["code"], "INVALID_ARGUMENT");
}

#[tokio::test]
async fn keyword_opportunities_without_credentials_is_bad_gateway() {
    let resp = app()
        .oneshot(post_json("/keyword-opportunities", r#"{"target": "https://setsail.ca"}"#))
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(
        body_json(resp).await,
        json!({"error": "DATAFORSEO credentials not set"})
    );
}
