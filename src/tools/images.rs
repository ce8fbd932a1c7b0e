use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::info;

use crate::api::GeminiApi;
use crate::error::KeywordError;
use crate::router::McpState;
use crate::storage::content_type_for;
use crate::tools::{ToolRegistry, object_schema};
use crate::types::gemini::{GenerateContentRequest, GenerateContentResponse, InlineImage};

fn default_filename() -> String {
    "generated_image.png".to_string()
}

#[derive(Debug, Deserialize)]
pub struct GenerateImageArgs {
    pub prompt: String,
    #[serde(default = "default_filename")]
    pub filename: String,
}

/// Generate an image with Gemini and publish it to the image bucket.
pub async fn generate_image(
    state: McpState,
    args: GenerateImageArgs,
) -> Result<Value, KeywordError> {
    let cfg = &state.config;
    let api_key = cfg.google_api_key().ok_or_else(|| {
        KeywordError::MissingConfig("GOOGLE_API_KEY environment variable is not set.".into())
    })?;
    let Some(store) = state.images.as_ref() else {
        let message = if cfg.s3_credentials().is_none() {
            "AWS credentials not configured. Set AWS_ACCESS_KEY_ID, AWS_SECRET_ACCESS_KEY, and AWS_S3_BUCKET."
        } else {
            "AWS_S3_BUCKET environment variable is not set."
        };
        return Err(KeywordError::MissingConfig(message.into()));
    };

    let url = GeminiApi::generate_url(&cfg.gemini_base_url, &cfg.gemini_image_model)?;
    let resp = GeminiApi::generate_content(
        state.client.clone(),
        url,
        api_key,
        state.gemini_retry,
        &GenerateContentRequest::from_prompt(args.prompt.clone()),
    )
    .await?;

    let image = extract_image(&resp)?;
    let bytes = STANDARD.decode(image.data.as_bytes())?;
    let content_type = if image.mime_type.is_empty() {
        content_type_for(&args.filename).to_string()
    } else {
        image.mime_type.clone()
    };

    store
        .put_object(&args.filename, bytes, &content_type)
        .await?;
    info!(filename = %args.filename, %content_type, "image generated and hosted");

    Ok(json!({
        "url": store.public_url(&args.filename),
        "filename": args.filename,
        "prompt": args.prompt,
        "model": cfg.gemini_image_model,
        "mime_type": image.mime_type,
        "hosting_service": "aws_s3",
        "bucket": store.bucket(),
    }))
}

fn extract_image(resp: &GenerateContentResponse) -> Result<InlineImage, KeywordError> {
    let candidate = resp.candidates.first().ok_or_else(|| {
        KeywordError::UnexpectedResponse("No candidates in Google Gemini API response".into())
    })?;
    let content = candidate
        .content
        .as_ref()
        .filter(|c| !c.parts.is_empty())
        .ok_or_else(|| {
            KeywordError::UnexpectedResponse(
                "No content/parts in Google Gemini API response".into(),
            )
        })?;
    content.inline_image().ok_or_else(|| {
        KeywordError::UnexpectedResponse(format!(
            "No inlineData found in any part. Part types found: {:?}",
            content.part_kinds()
        ))
    })
}

pub fn register(registry: &mut ToolRegistry) {
    registry.register(
        "generate_image",
        "Generate an image from a text prompt with Google Gemini and host it on AWS S3. \
         Returns the public URL and metadata.",
        object_schema(
            json!({
                "prompt": {"type": "string", "description": "Description of the image to generate."},
                "filename": {"type": "string", "default": "generated_image.png"},
            }),
            &["prompt"],
        ),
        generate_image,
    );
}
