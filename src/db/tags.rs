use sqlx::PgPool;
use uuid::Uuid;

use crate::models::TagAppearance;

pub async fn list(pool: &PgPool, user_id: Uuid) -> Result<Vec<TagAppearance>, sqlx::Error> {
    sqlx::query_as::<_, TagAppearance>(
        "SELECT * FROM tag_appearances WHERE user_id = $1
         ORDER BY occurrences DESC, tag ASC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

/// Bump each tag by one, creating rows for tags seen for the first time.
pub async fn record(
    pool: &PgPool,
    user_id: Uuid,
    tags: &[String],
) -> Result<Vec<TagAppearance>, sqlx::Error> {
    sqlx::query_as::<_, TagAppearance>(
        "INSERT INTO tag_appearances (user_id, tag, occurrences, last_seen_at)
         SELECT $1, t, 1, now() FROM UNNEST($2::text[]) AS t
         ON CONFLICT (user_id, tag) DO UPDATE
         SET occurrences = tag_appearances.occurrences + 1, last_seen_at = now()
         RETURNING *",
    )
    .bind(user_id)
    .bind(tags)
    .fetch_all(pool)
    .await
}
