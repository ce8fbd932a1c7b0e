use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use uuid::Uuid;

use crate::middleware::auth::RequireKeyAuth;
use crate::router::McpState;
use crate::service::mcp::{McpReply, handle_payload};

pub const SESSION_HEADER: &str = "mcp-session-id";

pub async fn mcp_post_handler(
    State(state): State<McpState>,
    _auth: RequireKeyAuth,
    body: Bytes,
) -> Response {
    match handle_payload(&state, &body).await {
        McpReply::Accepted => StatusCode::ACCEPTED.into_response(),
        McpReply::Json { body, new_session } => {
            let mut resp = Json(body).into_response();
            if new_session
                && let Ok(session) = HeaderValue::from_str(&Uuid::new_v4().to_string())
            {
                resp.headers_mut().insert(SESSION_HEADER, session);
            }
            resp
        }
    }
}

/// No server-initiated SSE stream is offered.
pub async fn mcp_get_handler(_auth: RequireKeyAuth) -> Response {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        [(header::ALLOW, "POST, DELETE")],
    )
        .into_response()
}

/// Sessions hold no server state, so termination always succeeds.
pub async fn mcp_delete_handler(_auth: RequireKeyAuth) -> StatusCode {
    StatusCode::NO_CONTENT
}
