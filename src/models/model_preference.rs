use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct ModelPreference {
    #[serde(skip_serializing)]
    pub user_id: Uuid,
    pub model: String,
    pub temperature: f64,
    pub max_tokens: i32,
    pub updated_at: DateTime<Utc>,
}
