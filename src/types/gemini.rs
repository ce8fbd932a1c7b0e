use serde::{Deserialize, Serialize};
use serde_json::Value;

/// `generateContent` request body with a single text prompt.
#[derive(Debug, Clone, Serialize)]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
}

impl GenerateContentRequest {
    pub fn from_prompt(prompt: impl Into<String>) -> Self {
        Self {
            contents: vec![Content {
                role: None,
                parts: vec![serde_json::json!({ "text": prompt.into() })],
            }],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Value>,
}

/// Gemini candidate wrapper.
#[derive(Debug, Clone, Deserialize)]
#[allow(non_snake_case)]
pub struct Candidate {
    pub content: Option<Content>,
    #[serde(default)]
    pub finishReason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[allow(non_snake_case)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    #[serde(default)]
    pub promptFeedback: Option<Value>,
}

/// Base64 payload of an image part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineImage {
    pub data: String,
    pub mime_type: String,
}

impl Content {
    /// First part carrying `inlineData`; earlier parts may be plain text.
    pub fn inline_image(&self) -> Option<InlineImage> {
        self.parts.iter().find_map(|part| {
            let inline = part.get("inlineData")?;
            let data = inline
                .get("data")?
                .as_str()
                .filter(|d| !d.is_empty())?
                .to_string();
            let mime_type = inline
                .get("mimeType")
                .and_then(Value::as_str)
                .unwrap_or("image/png")
                .to_string();
            Some(InlineImage { data, mime_type })
        })
    }

    /// Keys present on each part, for diagnostics when no image came back.
    pub fn part_kinds(&self) -> Vec<Vec<String>> {
        self.parts
            .iter()
            .map(|p| {
                p.as_object()
                    .map(|o| o.keys().cloned().collect())
                    .unwrap_or_default()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn inline_image_skips_leading_text_parts() {
        let content: Content = serde_json::from_value(json!({
            "role": "model",
            "parts": [
                {"text": "Here is your image"},
                {"inlineData": {"mimeType": "image/jpeg", "data": "AAEC"}}
            ]
        }))
        .unwrap();

        assert_eq!(
            content.inline_image(),
            Some(InlineImage {
                data: "AAEC".into(),
                mime_type: "image/jpeg".into()
            })
        );
    }

    #[test]
    fn missing_inline_data_reports_part_kinds() {
        let content: Content =
            serde_json::from_value(json!({"parts": [{"text": "refused"}]})).unwrap();
        assert!(content.inline_image().is_none());
        assert_eq!(content.part_kinds(), vec![vec!["text".to_string()]]);
    }

    #[test]
    fn request_body_shape() {
        let body = serde_json::to_value(GenerateContentRequest::from_prompt("a red kite")).unwrap();
        assert_eq!(body, json!({"contents": [{"parts": [{"text": "a red kite"}]}]}));
    }
}
