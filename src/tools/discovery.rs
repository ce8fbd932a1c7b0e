use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::RngCore;
use serde::Deserialize;
use serde_json::{Map, Value, json};
use tracing::info;

use crate::error::KeywordError;
use crate::router::McpState;
use crate::tools::content::{ClientArgs, client_id_schema};
use crate::tools::{ToolRegistry, object_schema};
use crate::types::discovery::{DISCOVERY_FIELDS, DiscoveryField, FieldKind, collect_updates};

/// 32 random bytes, URL-safe Base64 without padding.
pub fn new_edit_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

#[derive(Debug, Deserialize)]
pub struct UpdateDiscoveryArgs {
    pub client_id: i32,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

pub async fn update_discovery_document(
    state: McpState,
    args: UpdateDiscoveryArgs,
) -> Result<Value, KeywordError> {
    let db = state.db()?;
    let updates = collect_updates(&args.fields)?;
    if updates.is_empty() {
        return Ok(json!({
            "status": "no_changes",
            "client_id": args.client_id,
            "message": "No fields provided to update",
        }));
    }

    let action = db
        .upsert_discovery_document(args.client_id, &updates, &new_edit_token())
        .await?;
    let field_names: Vec<&str> = updates.iter().map(|(f, _)| f.name).collect();
    info!(
        client_id = args.client_id,
        action = action.as_str(),
        fields = field_names.len(),
        "discovery document saved"
    );
    Ok(json!({
        "status": "success",
        "action": action,
        "client_id": args.client_id,
        "fields_updated": field_names.len(),
        "field_names": field_names,
    }))
}

pub async fn get_discovery_document(
    state: McpState,
    args: ClientArgs,
) -> Result<Value, KeywordError> {
    state
        .db()?
        .discovery_document(args.client_id)
        .await?
        .ok_or_else(|| {
            KeywordError::NotFound(format!(
                "Discovery document not found for client_id={}",
                args.client_id
            ))
        })
}

fn field_schema(field: &DiscoveryField) -> Value {
    let ty = match field.kind {
        FieldKind::Text => json!(["string", "null"]),
        FieldKind::Integer => json!(["integer", "null"]),
        FieldKind::Boolean => json!(["boolean", "null"]),
        FieldKind::Json => json!(["string", "array", "object", "null"]),
    };
    json!({"type": ty, "description": field.description})
}

fn update_schema() -> Value {
    let mut properties = Map::new();
    properties.insert("client_id".to_string(), client_id_schema());
    for field in DISCOVERY_FIELDS {
        properties.insert(field.name.to_string(), field_schema(field));
    }
    object_schema(Value::Object(properties), &["client_id"])
}

pub fn register(registry: &mut ToolRegistry) {
    registry
        .register(
            "update_discovery_document",
            "Create or update a client's discovery document. Only the fields provided are \
             written. List-valued fields accept JSON text (e.g. '[\"Email\", \"SEO\"]'); plain \
             text is stored as a one-element list.",
            update_schema(),
            update_discovery_document,
        )
        .register(
            "get_discovery_document",
            "Fetch a client's discovery document with all of its fields.",
            object_schema(json!({"client_id": client_id_schema()}), &["client_id"]),
            get_discovery_document,
        );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edit_token_is_url_safe() {
        let token = new_edit_token();
        assert_eq!(token.len(), 43);
        assert!(token.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
        assert_ne!(token, new_edit_token());
    }

    #[test]
    fn flattened_args_keep_client_id_separate() {
        let args: UpdateDiscoveryArgs = serde_json::from_value(json!({
            "client_id": 12,
            "business_name": "Setsail"
        }))
        .unwrap();
        assert_eq!(args.client_id, 12);
        assert!(!args.fields.contains_key("client_id"));
        assert_eq!(args.fields["business_name"], "Setsail");
    }

    #[test]
    fn schema_lists_every_field() {
        let schema = update_schema();
        let props = schema["properties"].as_object().unwrap();
        assert_eq!(props.len(), DISCOVERY_FIELDS.len() + 1);
        assert_eq!(schema["required"], json!(["client_id"]));
    }
}
