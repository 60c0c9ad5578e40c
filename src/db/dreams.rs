use sqlx::PgPool;
use uuid::Uuid;

use crate::models::Dream;

pub async fn list(pool: &PgPool, user_id: Uuid) -> Result<Vec<Dream>, sqlx::Error> {
    sqlx::query_as::<_, Dream>(
        "SELECT * FROM dreams WHERE user_id = $1 ORDER BY created_at DESC, id DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

pub async fn create(
    pool: &PgPool,
    user_id: Uuid,
    title: &str,
    content: &str,
    tags: &[String],
) -> Result<Dream, sqlx::Error> {
    sqlx::query_as::<_, Dream>(
        "INSERT INTO dreams (user_id, title, content, tags) VALUES ($1, $2, $3, $4) RETURNING *",
    )
    .bind(user_id)
    .bind(title)
    .bind(content)
    .bind(tags)
    .fetch_one(pool)
    .await
}

pub async fn find_by_id(
    pool: &PgPool,
    id: i64,
    user_id: Uuid,
) -> Result<Option<Dream>, sqlx::Error> {
    sqlx::query_as::<_, Dream>("SELECT * FROM dreams WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
}

pub async fn update(
    pool: &PgPool,
    id: i64,
    user_id: Uuid,
    title: &str,
    content: &str,
    tags: &[String],
) -> Result<Dream, sqlx::Error> {
    sqlx::query_as::<_, Dream>(
        "UPDATE dreams SET title = $3, content = $4, tags = $5, updated_at = now()
         WHERE id = $1 AND user_id = $2 RETURNING *",
    )
    .bind(id)
    .bind(user_id)
    .bind(title)
    .bind(content)
    .bind(tags)
    .fetch_one(pool)
    .await
}

pub async fn set_interpretation(
    pool: &PgPool,
    id: i64,
    user_id: Uuid,
    interpretation: &serde_json::Value,
) -> Result<Dream, sqlx::Error> {
    sqlx::query_as::<_, Dream>(
        "UPDATE dreams SET interpretation = $3, updated_at = now()
         WHERE id = $1 AND user_id = $2 RETURNING *",
    )
    .bind(id)
    .bind(user_id)
    .bind(interpretation)
    .fetch_one(pool)
    .await
}

/// Returns whether a row was removed.
pub async fn delete(pool: &PgPool, id: i64, user_id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM dreams WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
