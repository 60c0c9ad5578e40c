use axum::extract::{Request, State};
use axum::http::Uri;
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::CookieJar;

use crate::auth::cookies::{ACCESS_COOKIE, REFRESH_COOKIE};
use crate::auth::jwt;
use crate::state::SharedState;

const PROTECTED_PAGES: &[&str] = &["/dreams", "/gallery", "/tags", "/settings"];
const GUEST_PAGES: &[&str] = &["/login", "/register", "/forgot-password", "/reset-password"];
const HOME: &str = "/dreams";

#[derive(Debug, PartialEq)]
enum Session {
    Active,
    /// Access token gone but a refresh cookie remains; the front end can renew it.
    Renewable,
    None,
}

/// Page navigation gate in front of the static front end.
pub async fn gate_pages(
    State(state): State<SharedState>,
    jar: CookieJar,
    req: Request,
    next: Next,
) -> Response {
    let session = session_of(&jar, &state.config.jwt_secret);
    let path = req.uri().path();

    if matches_any(path, PROTECTED_PAGES) && session == Session::None {
        let target = login_target(req.uri());
        return Redirect::to(&format!("/login?redirect={target}")).into_response();
    }

    if matches_any(path, GUEST_PAGES) && session == Session::Active {
        return Redirect::to(HOME).into_response();
    }

    next.run(req).await
}

/// `/login?redirect=` value for a page, keeping its query string.
fn login_target(uri: &Uri) -> String {
    let original = uri.path_and_query().map_or(uri.path(), |pq| pq.as_str());
    form_urlencoded::byte_serialize(original.as_bytes()).collect()
}

fn session_of(jar: &CookieJar, secret: &str) -> Session {
    let active = jar
        .get(ACCESS_COOKIE)
        .is_some_and(|c| jwt::decode_token(c.value(), secret).is_ok());

    if active {
        Session::Active
    } else if jar.get(REFRESH_COOKIE).is_some() {
        Session::Renewable
    } else {
        Session::None
    }
}

fn matches_any(path: &str, prefixes: &[&str]) -> bool {
    prefixes.iter().any(|p| {
        path == *p
            || path
                .strip_prefix(p)
                .is_some_and(|rest| rest.starts_with('/'))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_target_keeps_query() {
        let uri: Uri = "/dreams/4?tab=images".parse().unwrap();
        assert_eq!(login_target(&uri), "%2Fdreams%2F4%3Ftab%3Dimages");

        let uri: Uri = "/gallery".parse().unwrap();
        assert_eq!(login_target(&uri), "%2Fgallery");
    }

    #[test]
    fn prefix_matching_respects_segments() {
        assert!(matches_any("/dreams", PROTECTED_PAGES));
        assert!(matches_any("/dreams/12", PROTECTED_PAGES));
        assert!(!matches_any("/dreamscape", PROTECTED_PAGES));
        assert!(!matches_any("/", PROTECTED_PAGES));
    }

    #[test]
    fn refresh_cookie_alone_is_renewable() {
        let jar = CookieJar::new().add(axum_extra::extract::cookie::Cookie::new(REFRESH_COOKIE, "x"));
        assert_eq!(session_of(&jar, "secret"), Session::Renewable);
        assert_eq!(session_of(&CookieJar::new(), "secret"), Session::None);
    }
}
