//! JSON-RPC dispatch for the MCP endpoint.

use serde_json::{Value, json};
use tracing::{debug, info, warn};

use crate::config::SERVER_NAME;
use crate::router::McpState;
use crate::types::mcp::{
    CallToolRequest, ErrorCode, InitializeRequest, InitializeResponse, JSONRPC_VERSION,
    JsonRpcRequest, JsonRpcResponse, ListToolsResponse, ServerCapabilities, ServerInfo,
    ToolResponse, negotiate_protocol_version,
};

const INSTRUCTIONS: &str = "SEO toolkit: DataForSEO keyword research and competitor gaps, \
client content (keywords, HTML drafts, context, discovery documents), versioned strategy \
documents and AI image generation hosted on S3.";

/// What the transport should send back for one POST body.
#[derive(Debug, Clone, PartialEq)]
pub enum McpReply {
    /// Only notifications were received: `202 Accepted`, empty body.
    Accepted,
    /// A response object or batch array. `new_session` is set when the body
    /// contained an `initialize` request.
    Json { body: Value, new_session: bool },
}

/// Handle a raw POST body: a single message or a batch.
pub async fn handle_payload(state: &McpState, body: &[u8]) -> McpReply {
    let message: Value = match serde_json::from_slice(body) {
        Ok(v) => v,
        Err(e) => {
            debug!(error = %e, "unparsable MCP payload");
            return reply(
                JsonRpcResponse::error(None, ErrorCode::PARSE_ERROR, format!("Parse error: {e}")),
                false,
            );
        }
    };

    match message {
        Value::Array(batch) => {
            if batch.is_empty() {
                return reply(
                    JsonRpcResponse::error(
                        None,
                        ErrorCode::INVALID_REQUEST,
                        "Invalid Request: empty batch",
                    ),
                    false,
                );
            }
            let mut responses = Vec::with_capacity(batch.len());
            let mut new_session = false;
            for message in batch {
                new_session |= is_initialize(&message);
                if let Some(resp) = handle_message(state, message).await {
                    responses.push(resp);
                }
            }
            if responses.is_empty() {
                return McpReply::Accepted;
            }
            McpReply::Json {
                body: serde_json::to_value(responses).unwrap_or(Value::Null),
                new_session,
            }
        }
        message => {
            let new_session = is_initialize(&message);
            match handle_message(state, message).await {
                Some(resp) => reply(resp, new_session),
                None => McpReply::Accepted,
            }
        }
    }
}

fn reply(resp: JsonRpcResponse, new_session: bool) -> McpReply {
    McpReply::Json {
        body: serde_json::to_value(resp).unwrap_or(Value::Null),
        new_session,
    }
}

fn is_initialize(message: &Value) -> bool {
    message.get("method").and_then(Value::as_str) == Some("initialize")
        && message.get("id").is_some_and(|id| !id.is_null())
}

/// Handle one message. Notifications yield `None`.
pub async fn handle_message(state: &McpState, message: Value) -> Option<JsonRpcResponse> {
    let id = message.get("id").cloned().filter(|id| !id.is_null());
    let request: JsonRpcRequest = match serde_json::from_value(message) {
        Ok(r) => r,
        Err(e) => {
            return Some(JsonRpcResponse::error(
                id,
                ErrorCode::INVALID_REQUEST,
                format!("Invalid Request: {e}"),
            ));
        }
    };

    if request.jsonrpc != JSONRPC_VERSION {
        return Some(JsonRpcResponse::error(
            id,
            ErrorCode::INVALID_REQUEST,
            "Invalid Request: jsonrpc must be \"2.0\"",
        ));
    }

    if request.is_notification() || id.is_none() {
        debug!(method = %request.method, "notification");
        return None;
    }

    Some(handle_request(state, request).await)
}

pub async fn handle_request(state: &McpState, request: JsonRpcRequest) -> JsonRpcResponse {
    let id = request.id.clone();
    let params = request.params.unwrap_or(Value::Null);

    match request.method.as_str() {
        "initialize" => {
            let init: InitializeRequest = match serde_json::from_value(params) {
                Ok(init) => init,
                Err(e) => {
                    return JsonRpcResponse::error(
                        id,
                        ErrorCode::INVALID_PARAMS,
                        format!("Invalid params: {e}"),
                    );
                }
            };
            let version = negotiate_protocol_version(&init.protocol_version);
            info!(
                requested = %init.protocol_version,
                negotiated = version,
                client = init.client_info.as_ref().map(|c| c.name.as_str()).unwrap_or("<unknown>"),
                "MCP initialize"
            );
            let result = InitializeResponse {
                protocol_version: version.to_string(),
                capabilities: ServerCapabilities {
                    tools: json!({"listChanged": false}),
                },
                server_info: ServerInfo {
                    name: SERVER_NAME.to_string(),
                    version: env!("CARGO_PKG_VERSION").to_string(),
                },
                instructions: Some(INSTRUCTIONS.to_string()),
            };
            success(id, &result)
        }
        "ping" => JsonRpcResponse::success(id, json!({})),
        "tools/list" => success(
            id,
            &ListToolsResponse {
                tools: state.tools.metadata(),
            },
        ),
        "tools/call" => call_tool(state, id, params).await,
        "prompts/list" => JsonRpcResponse::success(id, json!({"prompts": []})),
        "resources/list" => JsonRpcResponse::success(id, json!({"resources": []})),
        "resources/templates/list" => {
            JsonRpcResponse::success(id, json!({"resourceTemplates": []}))
        }
        other => JsonRpcResponse::error(
            id,
            ErrorCode::METHOD_NOT_FOUND,
            format!("Method '{other}' not found"),
        ),
    }
}

fn success<T: serde::Serialize>(id: Option<Value>, result: &T) -> JsonRpcResponse {
    match serde_json::to_value(result) {
        Ok(v) => JsonRpcResponse::success(id, v),
        Err(e) => JsonRpcResponse::error(id, ErrorCode::INTERNAL_ERROR, e.to_string()),
    }
}

async fn call_tool(state: &McpState, id: Option<Value>, params: Value) -> JsonRpcResponse {
    let call: CallToolRequest = match serde_json::from_value(params) {
        Ok(c) => c,
        Err(e) => {
            return JsonRpcResponse::error(
                id,
                ErrorCode::INVALID_PARAMS,
                format!("Invalid params: {e}"),
            );
        }
    };
    let Some(tool) = state.tools.get(&call.name) else {
        return JsonRpcResponse::error(
            id,
            ErrorCode::INVALID_PARAMS,
            format!("Unknown tool: {}", call.name),
        );
    };

    info!(tool = %call.name, "tool call");
    let outcome = match tool.call(state.clone(), call.arguments).await {
        Ok(value) => ToolResponse::structured(value),
        Err(e) => {
            warn!(tool = %call.name, error = %e, "tool failed");
            ToolResponse::failure(format!("Error executing tool {}: {e}", call.name))
        }
    };
    success(id, &outcome)
}
