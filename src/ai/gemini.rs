use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};

use super::{AiError, GenerationRequest, GenerativeModel, ImageData, ImageRequest};
use crate::config::AiConfig;

/// Client for the Gemini `generateContent` REST endpoint.
pub struct GeminiClient {
    client: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
}

impl GeminiClient {
    pub fn new(config: &AiConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!("Falling back to default HTTP client for Gemini: {e}");
                reqwest::Client::new()
            });

        Self {
            client,
            api_key: config.api_key.clone(),
            base_url: config.base_url.clone(),
        }
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/v1beta/models/{model}:generateContent", self.base_url)
    }

    async fn generate(&self, model: &str, body: &Value) -> Result<GenerateContentResponse, AiError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| AiError::from("Gemini API key is not configured"))?;

        let resp = self
            .client
            .post(self.endpoint(model))
            .header("x-goog-api-key", api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| AiError::from(format!("Gemini request failed: {e}")))?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| AiError::from(format!("Failed to read Gemini response: {e}")))?;

        if !status.is_success() {
            return Err(AiError::from(format!(
                "Gemini returned {}: {}",
                status.as_u16(),
                upstream_message(&text)
            )));
        }

        serde_json::from_str(&text)
            .map_err(|e| AiError::from(format!("Unexpected Gemini response: {e}")))
    }
}

#[async_trait]
impl GenerativeModel for GeminiClient {
    fn provider(&self) -> &str {
        "gemini"
    }

    async fn generate_text(&self, request: &GenerationRequest) -> Result<String, AiError> {
        tracing::debug!(model = %request.model, "Gemini text generation");
        let resp = self.generate(&request.model, &text_body(request)).await?;
        resp.text()
    }

    async fn generate_image(&self, request: &ImageRequest) -> Result<ImageData, AiError> {
        tracing::debug!(model = %request.model, "Gemini image generation");
        let resp = self.generate(&request.model, &image_body(request)).await?;
        resp.image()
    }
}

fn text_body(request: &GenerationRequest) -> Value {
    let mut generation_config = json!({
        "temperature": request.temperature,
        "maxOutputTokens": request.max_tokens,
    });
    if request.json_output {
        generation_config["responseMimeType"] = json!("application/json");
    }

    json!({
        "contents": [{ "role": "user", "parts": [{ "text": request.prompt }] }],
        "generationConfig": generation_config,
    })
}

fn image_body(request: &ImageRequest) -> Value {
    json!({
        "contents": [{ "role": "user", "parts": [{ "text": request.prompt }] }],
        "generationConfig": { "responseModalities": ["TEXT", "IMAGE"] },
    })
}

/// Pull `error.message` out of a Gemini error body, falling back to the raw text.
fn upstream_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
        .unwrap_or_else(|| body.chars().take(512).collect())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<Content>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    text: Option<String>,
    inline_data: Option<InlineData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

impl GenerateContentResponse {
    fn parts(&self) -> Result<&[Part], AiError> {
        if let Some(reason) = self
            .prompt_feedback
            .as_ref()
            .and_then(|f| f.block_reason.as_deref())
        {
            return Err(AiError::from(format!("Prompt blocked by Gemini: {reason}")));
        }

        let candidate = self
            .candidates
            .first()
            .ok_or_else(|| AiError::from("Gemini returned no candidates"))?;

        match &candidate.content {
            Some(content) if !content.parts.is_empty() => Ok(&content.parts),
            _ => Err(AiError::from(format!(
                "Gemini returned an empty candidate (finish reason: {})",
                candidate.finish_reason.as_deref().unwrap_or("unknown")
            ))),
        }
    }

    fn text(&self) -> Result<String, AiError> {
        let text: String = self
            .parts()?
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect();
        if text.trim().is_empty() {
            return Err(AiError::from("Gemini returned no text"));
        }
        Ok(text)
    }

    fn image(&self) -> Result<ImageData, AiError> {
        self.parts()?
            .iter()
            .find_map(|p| p.inline_data.as_ref())
            .map(|d| ImageData {
                mime_type: d.mime_type.clone(),
                data: d.data.clone(),
            })
            .ok_or_else(|| AiError::from("Gemini returned no image"))
    }
}
