use axum::extract::{Path, Query, State};
use axum::response::Redirect;
use axum_extra::extract::CookieJar;
use serde::Deserialize;
use subtle::ConstantTimeEq;

use crate::auth::cookies::{self, OAUTH_STATE_COOKIE};
use crate::auth::oauth::{self, OAuthProfile};
use crate::auth::tokens;
use crate::config::OAuthProviderConfig;
use crate::db;
use crate::error::AppError;
use crate::models::User;
use crate::routes::auth::issue_session;
use crate::state::SharedState;

#[derive(Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

fn provider_config<'a>(state: &'a SharedState, name: &str) -> Result<&'a OAuthProviderConfig, AppError> {
    state
        .config
        .oauth_provider(name)
        .ok_or_else(|| AppError::NotFound(format!("Unknown sign-in provider: {name}")))
}

pub async fn authorize(
    State(state): State<SharedState>,
    Path(provider): Path<String>,
    jar: CookieJar,
) -> Result<(CookieJar, Redirect), AppError> {
    let config = provider_config(&state, &provider)?;

    let csrf_state = tokens::generate();
    let redirect_uri = oauth::redirect_uri(&state.config.base_url, &config.name);
    let url = oauth::authorize_url(config, &redirect_uri, &csrf_state);

    let secure = cookies::is_secure(&state.config.base_url);
    let jar = jar.add(cookies::oauth_state_cookie(&csrf_state, secure));
    Ok((jar, Redirect::to(&url)))
}

pub async fn callback(
    State(state): State<SharedState>,
    Path(provider): Path<String>,
    Query(query): Query<CallbackQuery>,
    jar: CookieJar,
) -> Result<(CookieJar, Redirect), AppError> {
    let config = provider_config(&state, &provider)?;

    if let Some(error) = query.error {
        return Err(AppError::BadRequest(format!("Sign-in was not completed: {error}")));
    }

    let expected = jar
        .get(OAUTH_STATE_COOKIE)
        .map(|c| c.value().to_string())
        .unwrap_or_default();
    let presented = query.state.unwrap_or_default();
    let state_matches = !expected.is_empty()
        && bool::from(expected.as_bytes().ct_eq(presented.as_bytes()));
    if !state_matches {
        return Err(AppError::BadRequest("Invalid OAuth state".to_string()));
    }

    let code = query
        .code
        .filter(|c| !c.is_empty())
        .ok_or_else(|| AppError::BadRequest("Missing authorization code".to_string()))?;

    let redirect_uri = oauth::redirect_uri(&state.config.base_url, &config.name);
    let access_token = oauth::exchange_code(&state.http, config, &code, &redirect_uri)
        .await
        .map_err(AppError::Upstream)?;
    let profile = oauth::fetch_profile(&state.http, config, &access_token)
        .await
        .map_err(AppError::Upstream)?;

    let user = find_or_create_user(&state, &config.name, &profile).await?;
    tracing::info!(user_id = %user.id, provider = %config.name, "OAuth sign-in");

    let jar = jar.add(cookies::clear_oauth_state_cookie());
    let (jar, _) = issue_session(&state, &user, jar).await?;
    Ok((jar, Redirect::to("/")))
}

/// Resolve the local account for a provider identity: an existing link, else an
/// account with the same email (which gets linked), else a new password-less account.
async fn find_or_create_user(
    state: &SharedState,
    provider: &str,
    profile: &OAuthProfile,
) -> Result<User, AppError> {
    let email = profile
        .email
        .as_deref()
        .ok_or_else(|| AppError::BadRequest(format!("{provider} did not share an email address")))?;

    let mut tx = state.pool.begin().await?;

    if let Some(link) = db::oauth_accounts::find(&mut *tx, provider, &profile.account_id).await? {
        tx.commit().await?;
        return db::users::find_by_id(&state.pool, link.user_id)
            .await?
            .ok_or_else(|| AppError::Internal("Linked user no longer exists".to_string()));
    }

    let user = match db::users::find_by_email(&mut *tx, email).await? {
        Some(user) => user,
        None => {
            let name = profile
                .name
                .clone()
                .unwrap_or_else(|| email.split('@').next().unwrap_or(email).to_string());
            db::users::create(&mut *tx, email, None, &name, profile.image.as_deref()).await?
        }
    };

    if let Some(image) = profile.image.as_deref() {
        db::users::set_image_if_missing(&mut *tx, user.id, image).await?;
    }
    db::oauth_accounts::link(&mut *tx, provider, &profile.account_id, user.id).await?;
    tx.commit().await?;

    Ok(user)
}
