use sqlx::PgPool;
use uuid::Uuid;

use crate::models::ModelPreference;

pub async fn find(pool: &PgPool, user_id: Uuid) -> Result<Option<ModelPreference>, sqlx::Error> {
    sqlx::query_as::<_, ModelPreference>("SELECT * FROM model_preferences WHERE user_id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await
}

pub async fn upsert(
    pool: &PgPool,
    user_id: Uuid,
    model: &str,
    temperature: f64,
    max_tokens: i32,
) -> Result<ModelPreference, sqlx::Error> {
    sqlx::query_as::<_, ModelPreference>(
        "INSERT INTO model_preferences (user_id, model, temperature, max_tokens)
         VALUES ($1, $2, $3, $4)
         ON CONFLICT (user_id) DO UPDATE
         SET model = EXCLUDED.model, temperature = EXCLUDED.temperature,
             max_tokens = EXCLUDED.max_tokens, updated_at = now()
         RETURNING *",
    )
    .bind(user_id)
    .bind(model)
    .bind(temperature)
    .bind(max_tokens)
    .fetch_one(pool)
    .await
}
