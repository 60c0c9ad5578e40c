use axum::extract::{Path, State};
use axum::Json;
use axum_extra::extract::WithRejection;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::JsonBody;
use super::preferences::{PreferenceView, validate_max_tokens, validate_temperature};
use super::tags::normalize_tags;
use crate::ai::{self, GenerationRequest, ImageRequest, prompts};
use crate::auth::extractor::AuthUser;
use crate::db;
use crate::db::images::NewImage;
use crate::error::AppError;
use crate::models::{Dream, GeneratedImage};
use crate::routes::dreams::find_owned;
use crate::state::SharedState;

const MAX_SUGGESTED_TAGS: usize = 8;
const INTERPRET_TEMPERATURE: f64 = 0.7;

#[derive(Deserialize)]
pub struct GenerateRequest {
    pub prompt: String,
    pub temperature: Option<f64>,
    pub max_tokens: Option<i32>,
    pub model: Option<String>,
}

#[derive(Serialize)]
pub struct GenerateResponse {
    pub text: String,
    pub model: String,
}

#[derive(Deserialize)]
pub struct SuggestTagsRequest {
    #[serde(default)]
    pub tags: Vec<String>,
    pub content: Option<String>,
}

#[derive(Serialize)]
pub struct SuggestTagsResponse {
    pub tags: Vec<String>,
}

#[derive(Deserialize)]
pub struct GenerateImageRequest {
    pub prompt: String,
    pub dream_id: Option<i64>,
    pub model: Option<String>,
}

/// Parameters for one call: explicit request values, then the user's stored
/// preference, then configuration defaults.
struct Params {
    model: String,
    temperature: f64,
    max_tokens: i32,
}

async fn resolve_params(
    state: &SharedState,
    user_id: Uuid,
    model: Option<String>,
    temperature: Option<f64>,
    max_tokens: Option<i32>,
) -> Result<Params, AppError> {
    if let Some(t) = temperature {
        validate_temperature(t)?;
    }
    if let Some(m) = max_tokens {
        validate_max_tokens(m)?;
    }

    let stored = db::preferences::find(&state.pool, user_id).await?;
    let pref = PreferenceView::resolve(stored, &state.config.ai);

    Ok(Params {
        model: model
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty())
            .unwrap_or(pref.model),
        temperature: temperature.unwrap_or(pref.temperature),
        max_tokens: max_tokens.unwrap_or(pref.max_tokens),
    })
}

pub async fn generate(
    auth: AuthUser,
    State(state): State<SharedState>,
    WithRejection(Json(req), _): JsonBody<GenerateRequest>,
) -> Result<Json<GenerateResponse>, AppError> {
    if req.prompt.trim().is_empty() {
        return Err(AppError::BadRequest("prompt is required".to_string()));
    }

    let params = resolve_params(&state, auth.user_id, req.model, req.temperature, req.max_tokens).await?;
    let raw = state
        .ai
        .generate_text(&GenerationRequest {
            prompt: req.prompt,
            model: params.model.clone(),
            temperature: params.temperature,
            max_tokens: params.max_tokens,
            json_output: false,
        })
        .await?;

    Ok(Json(GenerateResponse {
        text: ai::strip_code_fences(&raw).to_string(),
        model: params.model,
    }))
}

pub async fn interpret_dream(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> Result<Json<Dream>, AppError> {
    let dream = find_owned(&state, id, &auth).await?;
    let params = resolve_params(&state, auth.user_id, None, Some(INTERPRET_TEMPERATURE), None).await?;

    let raw = state
        .ai
        .generate_text(&GenerationRequest {
            prompt: prompts::interpret_dream(&dream.title, &dream.content, &dream.tags),
            model: params.model,
            temperature: params.temperature,
            max_tokens: params.max_tokens,
            json_output: true,
        })
        .await?;

    let interpretation: serde_json::Value = ai::parse_json_response(&raw)?;
    if !interpretation.is_object() {
        return Err(AppError::Upstream(
            "Model returned JSON that is not an object".to_string(),
        ));
    }

    let dream = db::dreams::set_interpretation(&state.pool, dream.id, auth.user_id, &interpretation).await?;
    Ok(Json(dream))
}

/// Context-menu helper: failures degrade to an empty suggestion list.
pub async fn suggest_tags(
    auth: AuthUser,
    State(state): State<SharedState>,
    WithRejection(Json(req), _): JsonBody<SuggestTagsRequest>,
) -> Json<SuggestTagsResponse> {
    let existing = normalize_tags(&req.tags);
    let tags = match request_suggestions(&state, auth.user_id, &existing, req.content.as_deref()).await {
        Ok(tags) => tags,
        Err(e) => {
            tracing::warn!("Tag suggestion failed, returning none: {e}");
            Vec::new()
        }
    };
    Json(SuggestTagsResponse { tags })
}

async fn request_suggestions(
    state: &SharedState,
    user_id: Uuid,
    existing: &[String],
    content: Option<&str>,
) -> Result<Vec<String>, AppError> {
    let params = resolve_params(state, user_id, None, None, None).await?;
    let raw = state
        .ai
        .generate_text(&GenerationRequest {
            prompt: prompts::suggest_tags(existing, content),
            model: params.model,
            temperature: params.temperature,
            max_tokens: params.max_tokens,
            json_output: true,
        })
        .await?;

    let suggested: Vec<String> = ai::parse_json_response(&raw)?;
    Ok(normalize_tags(&suggested)
        .into_iter()
        .filter(|t| !existing.contains(t))
        .take(MAX_SUGGESTED_TAGS)
        .collect())
}

pub async fn generate_image(
    auth: AuthUser,
    State(state): State<SharedState>,
    WithRejection(Json(req), _): JsonBody<GenerateImageRequest>,
) -> Result<Json<GeneratedImage>, AppError> {
    let prompt = req.prompt.trim();
    if prompt.is_empty() {
        return Err(AppError::BadRequest("prompt is required".to_string()));
    }
    if let Some(dream_id) = req.dream_id {
        find_owned(&state, dream_id, &auth).await?;
    }

    let model = req
        .model
        .map(|m| m.trim().to_string())
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| state.config.ai.image_model.clone());

    let image = state
        .ai
        .generate_image(&ImageRequest {
            prompt: prompts::dream_image(prompt),
            model: model.clone(),
        })
        .await?;

    let stored = db::images::create(
        &state.pool,
        auth.user_id,
        NewImage {
            dream_id: req.dream_id,
            prompt,
            model: &model,
            mime_type: &image.mime_type,
            data: &image.data,
        },
    )
    .await?;

    tracing::info!(image_id = stored.id, provider = state.ai.provider(), "Image generated");
    Ok(Json(stored))
}
