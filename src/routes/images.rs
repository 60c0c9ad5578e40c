use axum::extract::{Path, State};
use axum::Json;
use axum_extra::extract::WithRejection;
use serde::Deserialize;

use super::JsonBody;
use crate::auth::extractor::AuthUser;
use crate::db;
use crate::db::images::NewImage;
use crate::error::AppError;
use crate::models::GeneratedImage;
use crate::routes::dreams::find_owned;
use crate::state::SharedState;

#[derive(Deserialize)]
pub struct StoreImage {
    pub prompt: String,
    pub model: String,
    pub mime_type: String,
    pub data: String,
    pub dream_id: Option<i64>,
}

pub async fn list(
    auth: AuthUser,
    State(state): State<SharedState>,
) -> Result<Json<Vec<GeneratedImage>>, AppError> {
    let images = db::images::list(&state.pool, auth.user_id).await?;
    Ok(Json(images))
}

pub async fn list_by_dream(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(dream_id): Path<i64>,
) -> Result<Json<Vec<GeneratedImage>>, AppError> {
    find_owned(&state, dream_id, &auth).await?;
    let images = db::images::list_by_dream(&state.pool, dream_id, auth.user_id).await?;
    Ok(Json(images))
}

pub async fn create(
    auth: AuthUser,
    State(state): State<SharedState>,
    WithRejection(Json(req), _): JsonBody<StoreImage>,
) -> Result<Json<GeneratedImage>, AppError> {
    if req.prompt.trim().is_empty() || req.model.trim().is_empty() || req.data.is_empty() {
        return Err(AppError::BadRequest(
            "prompt, model and data are required".to_string(),
        ));
    }
    if !req.mime_type.starts_with("image/") {
        return Err(AppError::BadRequest(
            "mime_type must be an image type".to_string(),
        ));
    }
    if let Some(dream_id) = req.dream_id {
        find_owned(&state, dream_id, &auth).await?;
    }

    let image = db::images::create(
        &state.pool,
        auth.user_id,
        NewImage {
            dream_id: req.dream_id,
            prompt: req.prompt.trim(),
            model: req.model.trim(),
            mime_type: &req.mime_type,
            data: &req.data,
        },
    )
    .await?;
    Ok(Json(image))
}

pub async fn get(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> Result<Json<GeneratedImage>, AppError> {
    let image = db::images::find_by_id(&state.pool, id, auth.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Image not found".to_string()))?;
    Ok(Json(image))
}

pub async fn delete(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, AppError> {
    if !db::images::delete(&state.pool, id, auth.user_id).await? {
        return Err(AppError::NotFound("Image not found".to_string()));
    }
    Ok(Json(serde_json::json!({ "message": "Deleted" })))
}
