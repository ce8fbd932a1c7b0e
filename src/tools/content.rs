//! Client content tools backed by the content database.

use serde::Deserialize;
use serde_json::{Map, Value, json};
use tracing::info;

use crate::error::KeywordError;
use crate::router::McpState;
use crate::tools::{ToolRegistry, object_schema};

const OVERVIEW_FIELDS: [&str; 7] = [
    "domain",
    "call_to_action",
    "about",
    "competitors",
    "ideal_target_market",
    "company_details",
    "social_links",
];

const WRITING_RULE_FIELDS: [&str; 5] = [
    "brand_pov",
    "brand_safety",
    "questionnaire",
    "author_tone",
    "author_rules",
];

#[derive(Debug, Deserialize)]
pub struct AddKeywordArgs {
    pub client_id: i32,
    pub keyword: String,
    #[serde(default)]
    pub search_volume: Option<i64>,
    #[serde(default)]
    pub keyword_difficulty: Option<i64>,
}

pub async fn add_keyword(state: McpState, args: AddKeywordArgs) -> Result<Value, KeywordError> {
    let db = state.db()?;
    let keyword = args.keyword.trim();
    if keyword.is_empty() {
        return Err(KeywordError::Validation("Keyword cannot be empty".into()));
    }

    if let Some(keyword_id) = db.find_keyword_idea(args.client_id, keyword).await? {
        return Ok(keyword_exists(args.client_id, keyword, keyword_id));
    }

    let keyword_id = db
        .insert_keyword_idea(
            args.client_id,
            keyword,
            args.search_volume,
            args.keyword_difficulty,
        )
        .await?;
    info!(client_id = args.client_id, keyword_id, "keyword added");
    Ok(keyword_added(&args, keyword, keyword_id))
}

fn keyword_exists(client_id: i32, keyword: &str, keyword_id: i64) -> Value {
    json!({
        "status": "already_exists",
        "client_id": client_id,
        "keyword": keyword,
        "keyword_id": keyword_id,
        "message": format!("Keyword '{keyword}' already exists for this client"),
    })
}

fn keyword_added(args: &AddKeywordArgs, keyword: &str, keyword_id: i64) -> Value {
    json!({
        "status": "success",
        "client_id": args.client_id,
        "keyword": keyword,
        "keyword_id": keyword_id,
        "search_volume": args.search_volume,
        "keyword_difficulty": args.keyword_difficulty,
        "message": format!("Successfully added keyword '{keyword}' to client {}", args.client_id),
    })
}

#[derive(Debug, Deserialize)]
pub struct ReadHtmlArgs {
    pub client_id: i32,
    pub blog_id: i32,
    pub version_number: i32,
}

pub async fn read_html(state: McpState, args: ReadHtmlArgs) -> Result<Value, KeywordError> {
    let artifact = state
        .db()?
        .html_artifact(args.client_id, args.blog_id, args.version_number)
        .await?
        .ok_or_else(|| {
            KeywordError::NotFound(format!(
                "HTML artifact not found for client_id={}, blog_id={}, version_number={}",
                args.client_id, args.blog_id, args.version_number
            ))
        })?;
    Ok(json!({
        "client_id": artifact.client_id,
        "blog_id": artifact.blog_idea_id,
        "version_number": artifact.version_number,
        "html": artifact.html,
    }))
}

#[derive(Debug, Deserialize)]
pub struct WriteHtmlArgs {
    pub client_id: i32,
    pub blog_id: i32,
    pub version_number: i32,
    pub html: String,
}

pub async fn write_html(state: McpState, args: WriteHtmlArgs) -> Result<Value, KeywordError> {
    state
        .db()?
        .insert_html_version(args.client_id, args.blog_id, args.version_number, &args.html)
        .await?;
    info!(
        client_id = args.client_id,
        blog_id = args.blog_id,
        version_number = args.version_number,
        bytes = args.html.len(),
        "html version written"
    );
    Ok(json!({
        "client_id": args.client_id,
        "blog_id": args.blog_id,
        "version_number": args.version_number,
    }))
}

#[derive(Debug, Deserialize)]
pub struct ClientArgs {
    pub client_id: i32,
}

async fn client_context(state: &McpState, client_id: i32) -> Result<Value, KeywordError> {
    state
        .db()?
        .general_context(client_id)
        .await?
        .ok_or_else(|| {
            KeywordError::NotFound(format!("Client context not found for client_id={client_id}"))
        })
}

/// Copy `fields` out of a context row; absent columns come back as `null`.
fn pick(row: &Value, fields: &[&str]) -> Value {
    let out: Map<String, Value> = fields
        .iter()
        .map(|f| (f.to_string(), row.get(*f).cloned().unwrap_or(Value::Null)))
        .collect();
    Value::Object(out)
}

pub async fn get_client_overview(state: McpState, args: ClientArgs) -> Result<Value, KeywordError> {
    let row = client_context(&state, args.client_id).await?;
    Ok(pick(&row, &OVERVIEW_FIELDS))
}

pub async fn get_client_writing_rules(
    state: McpState,
    args: ClientArgs,
) -> Result<Value, KeywordError> {
    let row = client_context(&state, args.client_id).await?;
    Ok(pick(&row, &WRITING_RULE_FIELDS))
}

pub(crate) fn client_id_schema() -> Value {
    json!({"type": "integer", "description": "The client ID."})
}

pub fn register(registry: &mut ToolRegistry) {
    registry
        .register(
            "addKeyword",
            "Add a keyword to a client's keyword list, so keyword ideas can be saved \
             incrementally. Matching is case-insensitive; an existing keyword is reported \
             rather than duplicated.",
            object_schema(
                json!({
                    "client_id": client_id_schema(),
                    "keyword": {"type": "string"},
                    "search_volume": {"type": ["integer", "null"]},
                    "keyword_difficulty": {"type": ["integer", "null"]},
                }),
                &["client_id", "keyword"],
            ),
            add_keyword,
        )
        .register(
            "readHTML",
            "Fetch one stored HTML version of a blog post.",
            object_schema(
                json!({
                    "client_id": client_id_schema(),
                    "blog_id": {"type": "integer", "description": "The blog idea ID."},
                    "version_number": {"type": "integer"},
                }),
                &["client_id", "blog_id", "version_number"],
            ),
            read_html,
        )
        .register(
            "writeHTML",
            "Store a new HTML version of a blog post. version_number must be exactly one \
             higher than the current maximum version.",
            object_schema(
                json!({
                    "client_id": client_id_schema(),
                    "blog_id": {"type": "integer", "description": "The blog idea ID."},
                    "version_number": {"type": "integer", "description": "current max + 1"},
                    "html": {"type": "string"},
                }),
                &["client_id", "blog_id", "version_number", "html"],
            ),
            write_html,
        )
        .register(
            "getClientOverview",
            "Client overview from the general context: domain, call to action, about, \
             competitors, ideal target market, company details and social links.",
            object_schema(json!({"client_id": client_id_schema()}), &["client_id"]),
            get_client_overview,
        )
        .register(
            "getClientWritingRules",
            "Client writing rules from the general context: brand POV, brand safety, \
             questionnaire, author tone and author rules.",
            object_schema(json!({"client_id": client_id_schema()}), &["client_id"]),
            get_client_writing_rules,
        );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pick_fills_missing_columns_with_null() {
        let row = json!({"client_id": 7, "domain": "setsail.ca", "about": "Agency", "brand_pov": "x"});
        let out = pick(&row, &OVERVIEW_FIELDS);
        assert_eq!(out["domain"], "setsail.ca");
        assert!(out["social_links"].is_null());
        assert!(out.get("brand_pov").is_none());
        assert_eq!(out.as_object().unwrap().len(), 7);
    }

    #[test]
    fn duplicate_keyword_reports_existing_id() {
        let out = keyword_exists(4, "roof repair", 88);
        assert_eq!(out["status"], "already_exists");
        assert_eq!(out["keyword_id"], 88);
        assert_eq!(out["message"], "Keyword 'roof repair' already exists for this client");
    }

    #[test]
    fn added_keyword_echoes_metrics() {
        let args: AddKeywordArgs = serde_json::from_value(json!({
            "client_id": 4,
            "keyword": "  roof repair ",
            "search_volume": 880
        }))
        .unwrap();
        let out = keyword_added(&args, args.keyword.trim(), 89);
        assert_eq!(out["status"], "success");
        assert_eq!(out["keyword"], "roof repair");
        assert_eq!(out["search_volume"], 880);
        assert!(out["keyword_difficulty"].is_null());
        assert_eq!(out["message"], "Successfully added keyword 'roof repair' to client 4");
    }

    #[tokio::test]
    async fn database_tools_require_database_url() {
        let state = McpState::with_client(Default::default(), reqwest::Client::new());
        let err = read_html(
            state,
            ReadHtmlArgs {
                client_id: 1,
                blog_id: 2,
                version_number: 3,
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.to_string(), "DATABASE_URL environment variable is not set.");
    }
}
