use axum::extract::{Path, State};
use axum::Json;
use axum_extra::extract::WithRejection;
use serde::Deserialize;

use super::JsonBody;
use super::tags::normalize_tags;
use crate::auth::extractor::AuthUser;
use crate::db;
use crate::error::AppError;
use crate::models::Dream;
use crate::state::SharedState;

const MAX_TITLE_LEN: usize = 200;

#[derive(Deserialize)]
pub struct DreamInput {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl DreamInput {
    fn validated(self) -> Result<(String, String, Vec<String>), AppError> {
        let title = self.title.trim().to_string();
        if title.is_empty() || title.chars().count() > MAX_TITLE_LEN {
            return Err(AppError::BadRequest(format!(
                "Title must be between 1 and {MAX_TITLE_LEN} characters"
            )));
        }
        if self.content.trim().is_empty() {
            return Err(AppError::BadRequest("Content is required".to_string()));
        }
        Ok((title, self.content, normalize_tags(&self.tags)))
    }
}

pub async fn list(
    auth: AuthUser,
    State(state): State<SharedState>,
) -> Result<Json<Vec<Dream>>, AppError> {
    let dreams = db::dreams::list(&state.pool, auth.user_id).await?;
    Ok(Json(dreams))
}

pub async fn create(
    auth: AuthUser,
    State(state): State<SharedState>,
    WithRejection(Json(req), _): JsonBody<DreamInput>,
) -> Result<Json<Dream>, AppError> {
    let (title, content, tags) = req.validated()?;
    let dream = db::dreams::create(&state.pool, auth.user_id, &title, &content, &tags).await?;
    tracing::debug!(dream_id = dream.id, "Dream created");
    Ok(Json(dream))
}

pub async fn get(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> Result<Json<Dream>, AppError> {
    let dream = find_owned(&state, id, &auth).await?;
    Ok(Json(dream))
}

pub async fn update(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    WithRejection(Json(req), _): JsonBody<DreamInput>,
) -> Result<Json<Dream>, AppError> {
    let (title, content, tags) = req.validated()?;
    let dream = db::dreams::update(&state.pool, id, auth.user_id, &title, &content, &tags)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => AppError::NotFound("Dream not found".to_string()),
            _ => AppError::Database(e),
        })?;
    Ok(Json(dream))
}

pub async fn delete(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, AppError> {
    if !db::dreams::delete(&state.pool, id, auth.user_id).await? {
        return Err(AppError::NotFound("Dream not found".to_string()));
    }
    Ok(Json(serde_json::json!({ "message": "Deleted" })))
}

/// A dream that belongs to someone else is indistinguishable from a missing one.
pub(crate) async fn find_owned(
    state: &SharedState,
    id: i64,
    auth: &AuthUser,
) -> Result<Dream, AppError> {
    db::dreams::find_by_id(&state.pool, id, auth.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Dream not found".to_string()))
}
