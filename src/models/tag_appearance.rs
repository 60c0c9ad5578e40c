use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct TagAppearance {
    #[serde(skip_serializing)]
    pub user_id: Uuid,
    pub tag: String,
    pub occurrences: i32,
    pub last_seen_at: DateTime<Utc>,
}
