use sqlx::PgPool;
use uuid::Uuid;

use crate::models::GeneratedImage;

pub struct NewImage<'a> {
    pub dream_id: Option<i64>,
    pub prompt: &'a str,
    pub model: &'a str,
    pub mime_type: &'a str,
    pub data: &'a str,
}

pub async fn create(
    pool: &PgPool,
    user_id: Uuid,
    image: NewImage<'_>,
) -> Result<GeneratedImage, sqlx::Error> {
    sqlx::query_as::<_, GeneratedImage>(
        "INSERT INTO generated_images (user_id, dream_id, prompt, model, mime_type, data)
         VALUES ($1, $2, $3, $4, $5, $6) RETURNING *",
    )
    .bind(user_id)
    .bind(image.dream_id)
    .bind(image.prompt)
    .bind(image.model)
    .bind(image.mime_type)
    .bind(image.data)
    .fetch_one(pool)
    .await
}

pub async fn list(pool: &PgPool, user_id: Uuid) -> Result<Vec<GeneratedImage>, sqlx::Error> {
    sqlx::query_as::<_, GeneratedImage>(
        "SELECT * FROM generated_images WHERE user_id = $1 ORDER BY created_at DESC, id DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

pub async fn list_by_dream(
    pool: &PgPool,
    dream_id: i64,
    user_id: Uuid,
) -> Result<Vec<GeneratedImage>, sqlx::Error> {
    sqlx::query_as::<_, GeneratedImage>(
        "SELECT * FROM generated_images WHERE dream_id = $1 AND user_id = $2
         ORDER BY created_at DESC, id DESC",
    )
    .bind(dream_id)
    .bind(user_id)
    .fetch_all(pool)
    .await
}

pub async fn find_by_id(
    pool: &PgPool,
    id: i64,
    user_id: Uuid,
) -> Result<Option<GeneratedImage>, sqlx::Error> {
    sqlx::query_as::<_, GeneratedImage>(
        "SELECT * FROM generated_images WHERE id = $1 AND user_id = $2",
    )
    .bind(id)
    .bind(user_id)
    .fetch_optional(pool)
    .await
}

pub async fn delete(pool: &PgPool, id: i64, user_id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM generated_images WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
