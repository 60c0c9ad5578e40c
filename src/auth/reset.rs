//! One-time password reset tokens.
//!
//! Only an Argon2id hash of each token is stored. Because every hash carries its
//! own salt, a presented token cannot be looked up by equality: it is verified
//! against every unexpired record in turn until one matches.

use chrono::{Duration, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::{password, tokens};
use crate::db;
use crate::error::AppError;
use crate::models::PasswordResetToken;

/// Issued tokens are 64 hex chars; anything much shorter cannot be one of ours.
pub const MIN_TOKEN_LEN: usize = 32;
pub const TOKEN_TTL_HOURS: i64 = 1;
/// Live tokens kept per user; issuing another drops the oldest.
pub const MAX_ACTIVE_TOKENS: i64 = 3;

pub const INVALID_TOKEN: &str = "Invalid or expired reset token";

/// Create a reset token for `user_id`, returning the plaintext to deliver out of band.
///
/// At most [`MAX_ACTIVE_TOKENS`] stay live per user, which bounds the
/// verification scan in [`consume`].
pub async fn issue(pool: &PgPool, user_id: Uuid) -> Result<String, AppError> {
    let token = tokens::generate();
    let token_hash = password::hash(&token).map_err(AppError::Internal)?;

    let mut tx = pool.begin().await?;
    db::password_reset_tokens::create(
        &mut *tx,
        user_id,
        &token_hash,
        Utc::now() + Duration::hours(TOKEN_TTL_HOURS),
    )
    .await?;
    let pruned =
        db::password_reset_tokens::prune_for_user(&mut *tx, user_id, MAX_ACTIVE_TOKENS).await?;
    tx.commit().await?;

    if pruned > 0 {
        tracing::debug!(%user_id, pruned, "Dropped older reset tokens");
    }
    Ok(token)
}

/// Check request fields before anything touches the database.
pub fn validate_request<'a>(
    token: Option<&'a str>,
    new_password: Option<&'a str>,
) -> Result<(&'a str, &'a str), AppError> {
    let (Some(token), Some(new_password)) = (token, new_password) else {
        return Err(AppError::BadRequest(
            "Token and password are required".to_string(),
        ));
    };

    if token.len() < MIN_TOKEN_LEN {
        return Err(AppError::BadRequest(INVALID_TOKEN.to_string()));
    }
    password::validate_new(new_password)?;

    Ok((token, new_password))
}

/// First candidate whose stored hash verifies against `token`, in the order given.
/// A record with an unreadable hash is skipped rather than failing the whole scan.
pub fn find_match<'a>(
    candidates: &'a [PasswordResetToken],
    token: &str,
) -> Option<&'a PasswordResetToken> {
    candidates.iter().find(|candidate| {
        match password::verify(token, &candidate.token_hash) {
            Ok(matched) => matched,
            Err(e) => {
                tracing::warn!(token_id = %candidate.id, "Skipping unreadable reset token hash: {e}");
                false
            }
        }
    })
}

/// Verify `token`, set the owner's password to `new_password` and drop every
/// reset token the owner still has. Returns the owner's id.
///
/// The password update, token deletion and session revocation commit together.
pub async fn consume(pool: &PgPool, token: &str, new_password: &str) -> Result<Uuid, AppError> {
    let candidates = db::password_reset_tokens::list_unexpired(pool).await?;
    tracing::debug!("Checking reset token against {} candidates", candidates.len());

    let presented = token.to_string();
    let matched = tokio::task::spawn_blocking(move || {
        find_match(&candidates, &presented).map(|t| t.user_id)
    })
    .await
    .map_err(|e| AppError::Internal(format!("Reset token scan failed: {e}")))?;

    let user_id = matched.ok_or_else(|| AppError::BadRequest(INVALID_TOKEN.to_string()))?;

    let pw_hash = password::hash(new_password).map_err(AppError::Internal)?;

    let mut tx = pool.begin().await?;
    db::users::update_password(&mut *tx, user_id, &pw_hash).await?;
    let removed = db::password_reset_tokens::delete_all_for_user(&mut *tx, user_id).await?;
    db::refresh_tokens::delete_all_for_user(&mut *tx, user_id).await?;
    tx.commit().await?;

    tracing::info!(%user_id, removed, "Password reset completed");
    Ok(user_id)
}
