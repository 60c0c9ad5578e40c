use axum::extract::State;
use axum::Json;
use axum_extra::extract::{CookieJar, WithRejection};
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};

use super::JsonBody;
use crate::auth::cookies::{self, REFRESH_COOKIE, REFRESH_TOKEN_DAYS};
use crate::auth::extractor::AuthUser;
use crate::auth::jwt::{Claims, encode_token};
use crate::auth::{password, reset, tokens};
use crate::client_ip::ClientIp;
use crate::config::RegistrationMode;
use crate::db;
use crate::error::AppError;
use crate::models::User;
use crate::state::SharedState;

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

/// Fields are optional so a missing one gets a specific message instead of a parse error.
#[derive(Deserialize)]
pub struct ResetPasswordRequest {
    pub token: Option<String>,
    pub password: Option<String>,
}

#[derive(Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub user: User,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Mint an access token and a fresh refresh token for `user` and set both cookies.
pub(crate) async fn issue_session(
    state: &SharedState,
    user: &User,
    jar: CookieJar,
) -> Result<(CookieJar, AuthResponse), AppError> {
    let claims = Claims::new(user.id, user.email.clone());
    let access_token =
        encode_token(&claims, &state.config.jwt_secret).map_err(AppError::Internal)?;

    let refresh = tokens::generate();
    db::refresh_tokens::create(
        &state.pool,
        user.id,
        &tokens::sha256_hex(&refresh),
        Utc::now() + Duration::days(REFRESH_TOKEN_DAYS),
    )
    .await?;

    let secure = cookies::is_secure(&state.config.base_url);
    let jar = cookies::auth_cookies(jar, &access_token, &refresh, secure);
    Ok((
        jar,
        AuthResponse {
            access_token,
            refresh_token: refresh,
            user: user.clone(),
        },
    ))
}

pub async fn register(
    State(state): State<SharedState>,
    jar: CookieJar,
    WithRejection(Json(req), _): JsonBody<RegisterRequest>,
) -> Result<(CookieJar, Json<AuthResponse>), AppError> {
    if state.config.registration == RegistrationMode::Closed {
        return Err(AppError::Forbidden("Registration is disabled".to_string()));
    }

    let email = req.email.trim();
    let name = req.name.trim();
    if email.is_empty() || req.password.is_empty() || name.is_empty() {
        return Err(AppError::BadRequest("All fields are required".to_string()));
    }
    if !email.contains('@') {
        return Err(AppError::BadRequest("Email address is invalid".to_string()));
    }
    password::validate_new(&req.password)?;

    let pw_hash = password::hash(&req.password).map_err(AppError::Internal)?;

    let user = db::users::create(&state.pool, email, Some(&pw_hash), name, None)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                AppError::Conflict("An account with this email already exists".to_string())
            }
            _ => AppError::Database(e),
        })?;

    tracing::info!(user_id = %user.id, "User registered");

    let (jar, body) = issue_session(&state, &user, jar).await?;
    Ok((jar, Json(body)))
}

pub async fn login(
    State(state): State<SharedState>,
    jar: CookieJar,
    WithRejection(Json(req), _): JsonBody<LoginRequest>,
) -> Result<(CookieJar, Json<AuthResponse>), AppError> {
    let email = req.email.trim();
    if state.login_limiter.check(email).is_err() {
        return Err(AppError::RateLimited(
            "Too many login attempts. Please try again later.".to_string(),
        ));
    }

    let user = db::users::find_by_email(&state.pool, email)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Invalid credentials".to_string()))?;

    let valid = match user.password_hash.as_deref() {
        Some(hash) => password::verify(&req.password, hash).map_err(AppError::Internal)?,
        None => false,
    };

    if !valid {
        state.login_limiter.record_failure(email);
        return Err(AppError::Unauthorized("Invalid credentials".to_string()));
    }
    state.login_limiter.reset(email);

    let (jar, body) = issue_session(&state, &user, jar).await?;
    Ok((jar, Json(body)))
}

pub async fn refresh(
    State(state): State<SharedState>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<AuthResponse>), AppError> {
    let refresh_value = jar
        .get(REFRESH_COOKIE)
        .map(|c| c.value().to_string())
        .ok_or_else(|| AppError::Unauthorized("Missing refresh token".to_string()))?;

    let stored = db::refresh_tokens::find_by_hash(&state.pool, &tokens::sha256_hex(&refresh_value))
        .await?
        .ok_or_else(|| AppError::Unauthorized("Invalid refresh token".to_string()))?;

    if stored.used || !db::refresh_tokens::mark_used(&state.pool, stored.id).await? {
        tracing::warn!(
            "Refresh token reuse detected for user {}. Revoking all sessions.",
            stored.user_id
        );
        db::refresh_tokens::delete_all_for_user(&state.pool, stored.user_id).await?;
        return Err(AppError::Unauthorized(
            "Refresh token reuse detected. All sessions revoked.".to_string(),
        ));
    }

    if stored.expires_at < Utc::now() {
        return Err(AppError::Unauthorized("Refresh token expired".to_string()));
    }

    let user = db::users::find_by_id(&state.pool, stored.user_id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("User not found".to_string()))?;

    let (jar, body) = issue_session(&state, &user, jar).await?;
    Ok((jar, Json(body)))
}

pub async fn logout(
    State(state): State<SharedState>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<MessageResponse>), AppError> {
    if let Some(cookie) = jar.get(REFRESH_COOKIE) {
        db::refresh_tokens::delete_by_hash(&state.pool, &tokens::sha256_hex(cookie.value()))
            .await?;
    }

    Ok((
        cookies::clear_auth_cookies(),
        Json(MessageResponse {
            message: "Logged out successfully".to_string(),
        }),
    ))
}

pub async fn session(
    State(state): State<SharedState>,
    auth: AuthUser,
) -> Result<Json<User>, AppError> {
    let user = db::users::find_by_id(&state.pool, auth.user_id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("User not found".to_string()))?;
    Ok(Json(user))
}

fn recovery_rate_limited() -> AppError {
    AppError::RateLimited(
        "Too many password reset requests. Please try again later.".to_string(),
    )
}

pub async fn forgot_password(
    State(state): State<SharedState>,
    ClientIp(ip): ClientIp,
    WithRejection(Json(req), _): JsonBody<ForgotPasswordRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    if state.recovery_limiter.hit(&ip.to_string()).is_err() {
        return Err(recovery_rate_limited());
    }

    // Same answer whether or not the account exists
    let response = Json(MessageResponse {
        message: "If that email is registered, a reset link has been sent.".to_string(),
    });

    let email = req.email.trim().to_lowercase();
    if state.reset_mail_limiter.hit(&email).is_err() {
        tracing::warn!("Reset email cap reached for an address; request ignored");
        return Ok(response);
    }

    tokio::spawn(async move {
        let user = match db::users::find_by_email(&state.pool, &email).await {
            Ok(Some(user)) => user,
            Ok(None) => return,
            Err(e) => {
                tracing::error!("Password reset lookup failed: {e}");
                return;
            }
        };

        let token = match reset::issue(&state.pool, user.id).await {
            Ok(token) => token,
            Err(e) => {
                tracing::error!("Failed to create password reset token: {e}");
                return;
            }
        };

        let reset_url = format!("{}/reset-password?token={token}", state.config.base_url);
        match &state.system_mailer {
            Some(mailer) => {
                if let Err(e) = mailer.send_password_reset(&user.email, &reset_url).await {
                    tracing::error!("Failed to send password reset email: {e}");
                }
            }
            None => {
                tracing::warn!("System SMTP not configured. Password reset link: {reset_url}");
            }
        }
    });

    Ok(response)
}

pub async fn reset_password(
    State(state): State<SharedState>,
    ClientIp(ip): ClientIp,
    WithRejection(Json(req), _): JsonBody<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    if state.recovery_limiter.hit(&ip.to_string()).is_err() {
        return Err(recovery_rate_limited());
    }

    let (token, new_password) =
        reset::validate_request(req.token.as_deref(), req.password.as_deref())?;

    let user_id = reset::consume(&state.pool, token, new_password).await?;

    if let Some(mailer) = state.system_mailer.clone() {
        let pool = state.pool.clone();
        tokio::spawn(async move {
            if let Ok(Some(user)) = db::users::find_by_id(&pool, user_id).await {
                if let Err(e) = mailer.send_password_changed(&user.email, &user.name).await {
                    tracing::error!("Failed to send password change notice: {e}");
                }
            }
        });
    }

    Ok(Json(MessageResponse {
        message: "Password has been reset successfully.".to_string(),
    }))
}

pub async fn change_password(
    State(state): State<SharedState>,
    auth: AuthUser,
    jar: CookieJar,
    WithRejection(Json(req), _): JsonBody<ChangePasswordRequest>,
) -> Result<(CookieJar, Json<AuthResponse>), AppError> {
    password::validate_new(&req.new_password)?;

    let user = db::users::find_by_id(&state.pool, auth.user_id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("User not found".to_string()))?;

    let Some(current_hash) = user.password_hash.as_deref() else {
        return Err(AppError::BadRequest(
            "This account has no password yet. Use password reset to set one.".to_string(),
        ));
    };

    let valid = password::verify(&req.current_password, current_hash).map_err(AppError::Internal)?;
    if !valid {
        return Err(AppError::Unauthorized(
            "Current password is incorrect".to_string(),
        ));
    }

    let pw_hash = password::hash(&req.new_password).map_err(AppError::Internal)?;

    let mut tx = state.pool.begin().await?;
    db::users::update_password(&mut *tx, user.id, &pw_hash).await?;
    db::refresh_tokens::delete_all_for_user(&mut *tx, user.id).await?;
    db::password_reset_tokens::delete_all_for_user(&mut *tx, user.id).await?;
    tx.commit().await?;

    tracing::info!(user_id = %user.id, "Password changed");

    let (jar, body) = issue_session(&state, &user, jar).await?;
    Ok((jar, Json(body)))
}
