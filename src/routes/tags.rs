use axum::extract::State;
use axum::Json;
use axum_extra::extract::WithRejection;
use serde::Deserialize;

use super::JsonBody;
use crate::auth::extractor::AuthUser;
use crate::db;
use crate::error::AppError;
use crate::models::TagAppearance;
use crate::state::SharedState;

const MAX_TAG_LEN: usize = 50;

#[derive(Deserialize)]
pub struct RecordAppearances {
    pub tags: Vec<String>,
}

/// Trim, lower-case and de-duplicate tags, keeping first-seen order and dropping blanks.
pub fn normalize_tags(tags: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag: String = tag.trim().to_lowercase().chars().take(MAX_TAG_LEN).collect();
        if !tag.is_empty() && !out.contains(&tag) {
            out.push(tag);
        }
    }
    out
}

pub async fn list(
    auth: AuthUser,
    State(state): State<SharedState>,
) -> Result<Json<Vec<TagAppearance>>, AppError> {
    let tags = db::tags::list(&state.pool, auth.user_id).await?;
    Ok(Json(tags))
}

pub async fn record(
    auth: AuthUser,
    State(state): State<SharedState>,
    WithRejection(Json(req), _): JsonBody<RecordAppearances>,
) -> Result<Json<Vec<TagAppearance>>, AppError> {
    let tags = normalize_tags(&req.tags);
    if tags.is_empty() {
        return Err(AppError::BadRequest("At least one tag is required".to_string()));
    }
    let recorded = db::tags::record(&state.pool, auth.user_id, &tags).await?;
    Ok(Json(recorded))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_dedupes_case_insensitively() {
        let raw = vec![
            " Ocean ".to_string(),
            "ocean".to_string(),
            "".to_string(),
            "Flying".to_string(),
            "   ".to_string(),
        ];
        assert_eq!(normalize_tags(&raw), vec!["ocean", "flying"]);
    }

    #[test]
    fn normalize_truncates_long_tags() {
        let long = "x".repeat(80);
        assert_eq!(normalize_tags(&[long])[0].len(), MAX_TAG_LEN);
    }
}
