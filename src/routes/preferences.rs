use axum::extract::State;
use axum::Json;
use axum_extra::extract::WithRejection;
use serde::{Deserialize, Serialize};

use super::JsonBody;
use crate::auth::extractor::AuthUser;
use crate::config::AiConfig;
use crate::db;
use crate::error::AppError;
use crate::models::ModelPreference;
use crate::state::SharedState;

pub const MAX_TEMPERATURE: f64 = 2.0;
pub const MAX_OUTPUT_TOKENS: i32 = 8192;

#[derive(Deserialize)]
pub struct UpdatePreference {
    pub model: String,
    pub temperature: f64,
    pub max_tokens: i32,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PreferenceView {
    pub model: String,
    pub temperature: f64,
    pub max_tokens: i32,
    /// False when nothing is stored and configuration defaults are shown.
    pub customized: bool,
}

impl PreferenceView {
    pub fn resolve(stored: Option<ModelPreference>, defaults: &AiConfig) -> Self {
        match stored {
            Some(p) => Self {
                model: p.model,
                temperature: p.temperature,
                max_tokens: p.max_tokens,
                customized: true,
            },
            None => Self {
                model: defaults.default_model.clone(),
                temperature: defaults.default_temperature,
                max_tokens: defaults.default_max_tokens,
                customized: false,
            },
        }
    }
}

pub fn validate_temperature(temperature: f64) -> Result<(), AppError> {
    if !(0.0..=MAX_TEMPERATURE).contains(&temperature) {
        return Err(AppError::BadRequest(format!(
            "temperature must be between 0 and {MAX_TEMPERATURE}"
        )));
    }
    Ok(())
}

pub fn validate_max_tokens(max_tokens: i32) -> Result<(), AppError> {
    if !(1..=MAX_OUTPUT_TOKENS).contains(&max_tokens) {
        return Err(AppError::BadRequest(format!(
            "max_tokens must be between 1 and {MAX_OUTPUT_TOKENS}"
        )));
    }
    Ok(())
}

pub async fn get(
    auth: AuthUser,
    State(state): State<SharedState>,
) -> Result<Json<PreferenceView>, AppError> {
    let stored = db::preferences::find(&state.pool, auth.user_id).await?;
    Ok(Json(PreferenceView::resolve(stored, &state.config.ai)))
}

pub async fn update(
    auth: AuthUser,
    State(state): State<SharedState>,
    WithRejection(Json(req), _): JsonBody<UpdatePreference>,
) -> Result<Json<PreferenceView>, AppError> {
    let model = req.model.trim();
    if model.is_empty() {
        return Err(AppError::BadRequest("model is required".to_string()));
    }
    validate_temperature(req.temperature)?;
    validate_max_tokens(req.max_tokens)?;

    let stored =
        db::preferences::upsert(&state.pool, auth.user_id, model, req.temperature, req.max_tokens)
            .await?;
    Ok(Json(PreferenceView::resolve(Some(stored), &state.config.ai)))
}
