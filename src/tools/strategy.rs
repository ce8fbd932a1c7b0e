//! Versioned strategy documents: read, list, create, and one edit tool per section.

use serde::Deserialize;
use serde_json::{Map, Value, json};
use tracing::info;

use crate::db::DbStrategy;
use crate::error::KeywordError;
use crate::router::McpState;
use crate::tools::content::{ClientArgs, client_id_schema};
use crate::tools::{ToolRegistry, object_schema};
use crate::types::strategy::{STRATEGY_SECTIONS, StrategySection, assemble_document};

fn not_found(client_id: i32, version_number: i32) -> KeywordError {
    KeywordError::NotFound(format!(
        "Strategy not found for client_id={client_id}, version_number={version_number}"
    ))
}

#[derive(Debug, Deserialize)]
pub struct StrategyVersionArgs {
    pub client_id: i32,
    pub version_number: i32,
}

pub async fn read_strategy(
    state: McpState,
    args: StrategyVersionArgs,
) -> Result<Value, KeywordError> {
    let strategy = state
        .db()?
        .strategy(args.client_id, args.version_number)
        .await?
        .ok_or_else(|| not_found(args.client_id, args.version_number))?;
    Ok(strategy_document(&strategy))
}

fn strategy_document(strategy: &DbStrategy) -> Value {
    let sections: Map<String, Value> = STRATEGY_SECTIONS
        .iter()
        .map(|s| {
            let content = strategy.section(s.key).unwrap_or_default();
            (s.key.to_string(), json!({"name": s.name, "content": content}))
        })
        .collect();
    json!({
        "client_id": strategy.client_id,
        "version_number": strategy.version_number,
        "created_at": strategy.created_at.map(|t| t.to_string()),
        "updated_at": strategy.updated_at.map(|t| t.to_string()),
        "full_document": assemble_document(|key| strategy.section(key)),
        "sections": sections,
    })
}

pub async fn list_strategy_versions(
    state: McpState,
    args: ClientArgs,
) -> Result<Value, KeywordError> {
    let versions = state.db()?.list_strategy_versions(args.client_id).await?;
    let versions: Vec<Value> = versions
        .iter()
        .map(|v| {
            json!({
                "version_number": v.version_number,
                "created_at": v.created_at.map(|t| t.to_string()),
                "updated_at": v.updated_at.map(|t| t.to_string()),
            })
        })
        .collect();
    Ok(json!({
        "client_id": args.client_id,
        "total_versions": versions.len(),
        "versions": versions,
    }))
}

#[derive(Debug, Deserialize)]
pub struct CreateStrategyArgs {
    pub client_id: i32,
    #[serde(default)]
    pub copy_from_version: Option<i32>,
}

pub async fn create_strategy(
    state: McpState,
    args: CreateStrategyArgs,
) -> Result<Value, KeywordError> {
    let version = state
        .db()?
        .create_strategy(args.client_id, args.copy_from_version)
        .await?;
    info!(client_id = args.client_id, version, copied_from = ?args.copy_from_version, "strategy created");
    Ok(json!({
        "status": "success",
        "client_id": args.client_id,
        "version_number": version,
        "copied_from": args.copy_from_version,
        "message": created_message(version, args.copy_from_version),
    }))
}

fn created_message(version: i32, copied_from: Option<i32>) -> String {
    match copied_from {
        Some(source) => format!("Created strategy version {version} (copied from v{source})"),
        None => format!("Created strategy version {version} (blank)"),
    }
}

#[derive(Debug, Deserialize)]
pub struct EditSectionArgs {
    pub client_id: i32,
    pub version_number: i32,
    pub content: String,
}

pub async fn edit_section(
    state: McpState,
    section: &'static StrategySection,
    args: EditSectionArgs,
) -> Result<Value, KeywordError> {
    let updated = state
        .db()?
        .update_strategy_section(args.client_id, args.version_number, section, &args.content)
        .await?;
    if !updated {
        return Err(not_found(args.client_id, args.version_number));
    }
    info!(
        client_id = args.client_id,
        version_number = args.version_number,
        section = section.key,
        "strategy section updated"
    );
    Ok(json!({
        "status": "success",
        "client_id": args.client_id,
        "version_number": args.version_number,
        "section_key": section.key,
        "section_name": section.name,
        "content_length": args.content.chars().count(),
    }))
}

fn version_schema() -> Value {
    json!({"type": "integer", "description": "The strategy version number."})
}

pub fn register(registry: &mut ToolRegistry) {
    registry
        .register(
            "readStrategy",
            "Read a complete strategy document: the assembled markdown plus every section \
             with its name.",
            object_schema(
                json!({"client_id": client_id_schema(), "version_number": version_schema()}),
                &["client_id", "version_number"],
            ),
            read_strategy,
        )
        .register(
            "listStrategyVersions",
            "List all strategy versions for a client, newest first.",
            object_schema(json!({"client_id": client_id_schema()}), &["client_id"]),
            list_strategy_versions,
        )
        .register(
            "createStrategy",
            "Create the next strategy version for a client, blank or copied from \
             copy_from_version.",
            object_schema(
                json!({
                    "client_id": client_id_schema(),
                    "copy_from_version": {"type": ["integer", "null"]},
                }),
                &["client_id"],
            ),
            create_strategy,
        );

    for section in STRATEGY_SECTIONS.iter() {
        registry.register(
            section.tool,
            format!(
                "Update {} of a strategy. content is the new markdown for this section.",
                section.heading
            ),
            object_schema(
                json!({
                    "client_id": client_id_schema(),
                    "version_number": version_schema(),
                    "content": {"type": "string", "description": "Markdown content."},
                }),
                &["client_id", "version_number", "content"],
            ),
            move |state, args: EditSectionArgs| edit_section(state, section, args),
        );
    }
}
