use uuid::Uuid;

use crate::models::OAuthAccount;

pub async fn find<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    provider: &str,
    provider_account_id: &str,
) -> Result<Option<OAuthAccount>, sqlx::Error> {
    sqlx::query_as::<_, OAuthAccount>(
        "SELECT * FROM oauth_accounts WHERE provider = $1 AND provider_account_id = $2",
    )
    .bind(provider)
    .bind(provider_account_id)
    .fetch_optional(executor)
    .await
}

pub async fn link<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    provider: &str,
    provider_account_id: &str,
    user_id: Uuid,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO oauth_accounts (provider, provider_account_id, user_id)
         VALUES ($1, $2, $3) ON CONFLICT (provider, provider_account_id) DO NOTHING",
    )
    .bind(provider)
    .bind(provider_account_id)
    .bind(user_id)
    .execute(executor)
    .await?;
    Ok(())
}
