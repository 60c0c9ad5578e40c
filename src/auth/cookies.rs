use axum_extra::extract::cookie::{Cookie, SameSite};
use axum_extra::extract::CookieJar;

use super::jwt::ACCESS_TOKEN_MINUTES;

pub const ACCESS_COOKIE: &str = "access_token";
pub const REFRESH_COOKIE: &str = "refresh_token";
pub const OAUTH_STATE_COOKIE: &str = "oauth_state";

pub const REFRESH_TOKEN_DAYS: i64 = 7;

/// Secure cookies are only set when the public base URL is served over TLS.
pub fn is_secure(base_url: &str) -> bool {
    base_url.starts_with("https://")
}

pub fn auth_cookies(jar: CookieJar, access_token: &str, refresh_token: &str, secure: bool) -> CookieJar {
    let access = Cookie::build((ACCESS_COOKIE, access_token.to_string()))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::minutes(ACCESS_TOKEN_MINUTES))
        .build();

    let refresh = Cookie::build((REFRESH_COOKIE, refresh_token.to_string()))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::days(REFRESH_TOKEN_DAYS))
        .build();

    jar.add(access).add(refresh)
}

pub fn clear_auth_cookies() -> CookieJar {
    CookieJar::new()
        .add(expired(ACCESS_COOKIE))
        .add(expired(REFRESH_COOKIE))
}

pub fn oauth_state_cookie(state: &str, secure: bool) -> Cookie<'static> {
    Cookie::build((OAUTH_STATE_COOKIE, state.to_string()))
        .path("/api/v1/auth/oauth")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::minutes(10))
        .build()
}

pub fn clear_oauth_state_cookie() -> Cookie<'static> {
    Cookie::build((OAUTH_STATE_COOKIE, ""))
        .path("/api/v1/auth/oauth")
        .max_age(time::Duration::ZERO)
        .build()
}

fn expired(name: &'static str) -> Cookie<'static> {
    Cookie::build((name, ""))
        .path("/")
        .max_age(time::Duration::ZERO)
        .build()
}
