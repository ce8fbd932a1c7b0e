use std::time::Duration;

use backon::{ExponentialBuilder, Retryable};
use tracing::{error, warn};
use url::Url;

use crate::error::KeywordError;
use crate::types::gemini::{GenerateContentRequest, GenerateContentResponse};

pub const GEMINI_TIMEOUT: Duration = Duration::from_secs(60);
pub const GEMINI_MAX_ATTEMPTS: usize = 3;

/// Three attempts in total, sleeping 1s then 2s between them.
pub fn default_retry_policy() -> ExponentialBuilder {
    ExponentialBuilder::default()
        .with_min_delay(Duration::from_secs(1))
        .with_factor(2.0)
        .with_max_times(GEMINI_MAX_ATTEMPTS - 1)
}

pub struct GeminiApi;

impl GeminiApi {
    pub fn generate_url(base_url: &Url, model: &str) -> Result<Url, KeywordError> {
        let base = base_url.as_str().trim_end_matches('/');
        Ok(Url::parse(&format!("{base}/models/{model}:generateContent"))?)
    }

    pub async fn generate_content(
        client: reqwest::Client,
        url: Url,
        api_key: impl AsRef<str>,
        retry_policy: ExponentialBuilder,
        body: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, KeywordError> {
        let resp = (|| async {
            client
                .post(url.clone())
                .header("x-goog-api-key", api_key.as_ref())
                .timeout(GEMINI_TIMEOUT)
                .json(body)
                .send()
                .await?
                .error_for_status()
        })
        .retry(retry_policy)
        .notify(|err: &reqwest::Error, dur: Duration| {
            warn!("Gemini request failed (will retry in {:?}): {}", dur, err);
        })
        .await
        .map_err(|source| {
            error!("Gemini request failed after {} attempts", GEMINI_MAX_ATTEMPTS);
            KeywordError::Gemini {
                attempts: GEMINI_MAX_ATTEMPTS,
                source,
            }
        })?;

        Ok(resp.json::<GenerateContentResponse>().await?)
    }
}
