pub mod gemini;
pub mod prompts;

use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub prompt: String,
    pub model: String,
    pub temperature: f64,
    pub max_tokens: i32,
    /// Ask the model for a JSON document instead of free text.
    pub json_output: bool,
}

#[derive(Debug, Clone)]
pub struct ImageRequest {
    pub prompt: String,
    pub model: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImageData {
    pub mime_type: String,
    /// Base64 encoded image bytes, exactly as returned upstream.
    pub data: String,
}

#[derive(Debug)]
pub struct AiError {
    pub message: String,
}

impl std::fmt::Display for AiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl From<String> for AiError {
    fn from(s: String) -> Self {
        AiError { message: s }
    }
}

impl From<&str> for AiError {
    fn from(s: &str) -> Self {
        AiError {
            message: s.to_string(),
        }
    }
}

/// A generative model backend. One instance is shared by every request.
#[async_trait]
pub trait GenerativeModel: Send + Sync {
    fn provider(&self) -> &str;
    async fn generate_text(&self, request: &GenerationRequest) -> Result<String, AiError>;
    async fn generate_image(&self, request: &ImageRequest) -> Result<ImageData, AiError>;
}

static FENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)^\s*```[\w-]*[ \t]*\n?(.*?)\s*```\s*$").unwrap());

/// Remove a markdown code fence wrapping the whole response, if there is one.
pub fn strip_code_fences(text: &str) -> &str {
    match FENCE_RE.captures(text).and_then(|caps| caps.get(1)) {
        Some(inner) => inner.as_str().trim(),
        None => text.trim(),
    }
}

/// Strip fences and parse the remaining text as JSON.
pub fn parse_json_response<T: DeserializeOwned>(text: &str) -> Result<T, AiError> {
    serde_json::from_str(strip_code_fences(text))
        .map_err(|e| AiError::from(format!("Model returned invalid JSON: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_json_fence() {
        let raw = "```json\n{\"tags\": [\"sea\"]}\n```";
        assert_eq!(strip_code_fences(raw), "{\"tags\": [\"sea\"]}");
    }

    #[test]
    fn strips_bare_fence_with_surrounding_whitespace() {
        let raw = "  \n```\nflying over water\n```\n ";
        assert_eq!(strip_code_fences(raw), "flying over water");
    }

    #[test]
    fn leaves_unfenced_text_alone() {
        assert_eq!(strip_code_fences("  plain answer "), "plain answer");
    }

    #[test]
    fn inner_fences_are_not_stripped() {
        let raw = "Here:\n```json\n{}\n```\ndone";
        assert_eq!(strip_code_fences(raw), raw.trim());
    }

    #[test]
    fn parse_json_reports_garbage() {
        let err = parse_json_response::<serde_json::Value>("```json\nnot json\n```").unwrap_err();
        assert!(err.message.starts_with("Model returned invalid JSON"));
    }

    #[test]
    fn parse_json_reads_fenced_document() {
        let value: Vec<String> = parse_json_response("```json\n[\"a\", \"b\"]\n```").unwrap();
        assert_eq!(value, vec!["a", "b"]);
    }
}
