use std::{num::NonZeroU32, sync::Arc, time::Duration};

use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::config::Config;
use crate::error::KeywordError;

pub const LABS_GOOGLE: &str = "dataforseo_labs/google";
pub const KEYWORDS_DATA_GOOGLE_ADS: &str = "keywords_data/google_ads";

/// Upper bound for the live `keyword_overview`/`keyword_ideas`/`ad_traffic` calls.
pub const LIVE_TIMEOUT: Duration = Duration::from_secs(120);
pub const LABS_TIMEOUT: Duration = Duration::from_secs(60);
pub const KEYWORDS_DATA_TIMEOUT: Duration = Duration::from_secs(120);

/// Thin DataForSEO v3 client: Basic auth, JSON task arrays, outbound throttling.
#[derive(Clone)]
pub struct DataForSeoApi {
    client: reqwest::Client,
    base_url: Url,
    auth: Option<String>,
    limiter: Arc<DefaultDirectRateLimiter>,
}

impl DataForSeoApi {
    pub fn new(client: reqwest::Client, cfg: &Config) -> Self {
        let per_minute = NonZeroU32::new(cfg.dataforseo_rate_limit).unwrap_or(NonZeroU32::MIN);
        Self {
            client,
            base_url: cfg.dataforseo_base_url.clone(),
            auth: cfg.dataforseo_basic_auth(),
            limiter: Arc::new(RateLimiter::direct(Quota::per_minute(per_minute))),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.auth.is_some()
    }

    pub fn endpoint(&self, path: &str) -> Result<Url, KeywordError> {
        let base = self.base_url.as_str().trim_end_matches('/');
        Ok(Url::parse(&format!("{base}/{}", path.trim_start_matches('/')))?)
    }

    /// POST one task array and return the decoded body.
    ///
    /// Non-2xx statuses are surfaced with the upstream body attached.
    pub async fn post<T>(
        &self,
        path: &str,
        payload: &T,
        timeout: Duration,
    ) -> Result<Value, KeywordError>
    where
        T: Serialize + ?Sized,
    {
        let auth = self
            .auth
            .as_deref()
            .ok_or_else(KeywordError::missing_dataforseo)?;
        let url = self.endpoint(path)?;

        self.limiter.until_ready().await;
        debug!(%url, "DataForSEO request");

        let resp = self
            .client
            .post(url)
            .header(reqwest::header::AUTHORIZATION, format!("Basic {auth}"))
            .timeout(timeout)
            .json(payload)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            warn!(%status, path, "DataForSEO request failed");
            return Err(KeywordError::UpstreamStatus { status, body });
        }
        Ok(resp.json::<Value>().await?)
    }

    pub async fn labs<T>(&self, endpoint: &str, payload: &T) -> Result<Value, KeywordError>
    where
        T: Serialize + ?Sized,
    {
        self.post(&format!("{LABS_GOOGLE}/{endpoint}"), payload, LABS_TIMEOUT)
            .await
    }

    pub async fn keywords_data<T>(&self, endpoint: &str, payload: &T) -> Result<Value, KeywordError>
    where
        T: Serialize + ?Sized,
    {
        self.post(
            &format!("{KEYWORDS_DATA_GOOGLE_ADS}/{endpoint}"),
            payload,
            KEYWORDS_DATA_TIMEOUT,
        )
        .await
    }
}
