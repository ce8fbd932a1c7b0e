use std::sync::Arc;
use std::time::Duration;

use axum::{
    Json, Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use backon::ExponentialBuilder;
use serde_json::{Value, json};

use crate::api::DataForSeoApi;
use crate::api::gemini_api::default_retry_policy;
use crate::config::Config;
use crate::db::ContentStore;
use crate::error::KeywordError;
use crate::handlers::mcp::{mcp_delete_handler, mcp_get_handler, mcp_post_handler};
use crate::handlers::opportunities::keyword_opportunities_handler;
use crate::storage::{ImageStore, S3ImageStore};
use crate::tools::{ToolRegistry, default_registry};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Shared handles for every route and tool call. Cheap to clone.
#[derive(Clone)]
pub struct McpState {
    pub config: Arc<Config>,
    pub client: reqwest::Client,
    pub dataforseo: DataForSeoApi,
    pub db: Option<ContentStore>,
    pub images: Option<Arc<dyn ImageStore>>,
    pub gemini_retry: ExponentialBuilder,
    pub tools: Arc<ToolRegistry>,
}

impl McpState {
    /// Wire up every backend the configuration enables. Nothing here touches the network.
    pub fn new(config: Config) -> Result<Self, KeywordError> {
        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()?;
        let db = config
            .database_url()
            .map(|url| ContentStore::connect_lazy(url, config.database_max_connections))
            .transpose()?;
        let images = S3ImageStore::from_config(&config).map(|s| Arc::new(s) as Arc<dyn ImageStore>);
        Ok(Self::with_client(config, client)
            .with_db(db)
            .with_images(images))
    }

    /// State without database or image hosting; callers attach those as needed.
    pub fn with_client(config: Config, client: reqwest::Client) -> Self {
        let dataforseo = DataForSeoApi::new(client.clone(), &config);
        Self {
            config: Arc::new(config),
            client,
            dataforseo,
            db: None,
            images: None,
            gemini_retry: default_retry_policy(),
            tools: Arc::new(default_registry()),
        }
    }

    pub fn with_db(mut self, db: Option<ContentStore>) -> Self {
        self.db = db;
        self
    }

    pub fn with_images(mut self, images: Option<Arc<dyn ImageStore>>) -> Self {
        self.images = images;
        self
    }

    pub fn with_gemini_retry(mut self, policy: ExponentialBuilder) -> Self {
        self.gemini_retry = policy;
        self
    }

    pub fn db(&self) -> Result<&ContentStore, KeywordError> {
        self.db.as_ref().ok_or_else(KeywordError::missing_database)
    }
}

pub fn mcp_router(state: McpState) -> Router {
    let body_limit = state.config.max_body_bytes;
    Router::new()
        .route(
            "/mcp",
            post(mcp_post_handler)
                .get(mcp_get_handler)
                .delete(mcp_delete_handler),
        )
        .route("/keyword-opportunities", post(keyword_opportunities_handler))
        .route("/health", get(health_handler))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

async fn health_handler() -> Json<Value> {
    Json(json!({"status": "ok"}))
}
