use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct OAuthAccount {
    pub provider: String,
    pub provider_account_id: String,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
}
