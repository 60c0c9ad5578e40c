use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct GeneratedImage {
    pub id: i64,
    pub user_id: Uuid,
    pub dream_id: Option<i64>,
    pub prompt: String,
    pub model: String,
    pub mime_type: String,
    pub data: String,
    pub created_at: DateTime<Utc>,
}
