use serde::Deserialize;
use serde_json::Value;

use crate::config::OAuthProviderConfig;

#[derive(Debug, Clone, PartialEq)]
pub struct OAuthProfile {
    pub account_id: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub image: Option<String>,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

pub fn redirect_uri(base_url: &str, provider: &str) -> String {
    format!("{base_url}/api/v1/auth/oauth/{provider}/callback")
}

pub fn authorize_url(provider: &OAuthProviderConfig, redirect_uri: &str, state: &str) -> String {
    let query = form_urlencoded::Serializer::new(String::new())
        .append_pair("response_type", "code")
        .append_pair("client_id", &provider.client_id)
        .append_pair("redirect_uri", redirect_uri)
        .append_pair("scope", &provider.scopes)
        .append_pair("state", state)
        .finish();

    let separator = if provider.authorize_url.contains('?') { '&' } else { '?' };
    format!("{}{separator}{query}", provider.authorize_url)
}

/// Trade an authorization code for the provider's access token.
pub async fn exchange_code(
    client: &reqwest::Client,
    provider: &OAuthProviderConfig,
    code: &str,
    redirect_uri: &str,
) -> Result<String, String> {
    let resp = client
        .post(&provider.token_url)
        .header("Accept", "application/json")
        .form(&[
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", redirect_uri),
            ("client_id", provider.client_id.as_str()),
            ("client_secret", provider.client_secret.as_str()),
        ])
        .send()
        .await
        .map_err(|e| format!("{} token request failed: {e}", provider.name))?;

    let status = resp.status();
    let body: TokenResponse = resp
        .json()
        .await
        .map_err(|e| format!("{} token response unreadable ({status}): {e}", provider.name))?;

    match body {
        TokenResponse {
            access_token: Some(token),
            ..
        } if status.is_success() => Ok(token),
        TokenResponse {
            error,
            error_description,
            ..
        } => Err(format!(
            "{} rejected the authorization code: {}",
            provider.name,
            error_description
                .or(error)
                .unwrap_or_else(|| status.to_string())
        )),
    }
}

pub async fn fetch_profile(
    client: &reqwest::Client,
    provider: &OAuthProviderConfig,
    access_token: &str,
) -> Result<OAuthProfile, String> {
    let resp = client
        .get(&provider.userinfo_url)
        .bearer_auth(access_token)
        .header("Accept", "application/json")
        // GitHub refuses requests without a user agent.
        .header("User-Agent", "dreamvault")
        .send()
        .await
        .map_err(|e| format!("{} profile request failed: {e}", provider.name))?;

    if !resp.status().is_success() {
        return Err(format!(
            "{} profile request returned {}",
            provider.name,
            resp.status()
        ));
    }

    let body: Value = resp
        .json()
        .await
        .map_err(|e| format!("{} profile response unreadable: {e}", provider.name))?;

    parse_profile(&body).ok_or_else(|| format!("{} profile has no account id", provider.name))
}

/// Normalise OpenID Connect (`sub`, `picture`) and GitHub (`id`, `login`, `avatar_url`) profiles.
pub fn parse_profile(body: &Value) -> Option<OAuthProfile> {
    let account_id = match body.get("sub").or_else(|| body.get("id"))? {
        Value::String(s) if !s.is_empty() => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };

    let string_field = |keys: &[&str]| {
        keys.iter()
            .find_map(|k| body.get(*k).and_then(Value::as_str))
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };

    Some(OAuthProfile {
        account_id,
        email: string_field(&["email"]),
        name: string_field(&["name", "login"]),
        image: string_field(&["picture", "avatar_url"]),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn provider() -> OAuthProviderConfig {
        OAuthProviderConfig {
            name: "google".to_string(),
            client_id: "client id".to_string(),
            client_secret: "secret".to_string(),
            authorize_url: "https://accounts.example/auth".to_string(),
            token_url: "https://accounts.example/token".to_string(),
            userinfo_url: "https://accounts.example/userinfo".to_string(),
            scopes: "openid email".to_string(),
        }
    }

    #[test]
    fn authorize_url_encodes_parameters() {
        let url = authorize_url(&provider(), "http://localhost:3000/cb", "abc");
        assert!(url.starts_with("https://accounts.example/auth?response_type=code"));
        assert!(url.contains("client_id=client+id"));
        assert!(url.contains("redirect_uri=http%3A%2F%2Flocalhost%3A3000%2Fcb"));
        assert!(url.contains("scope=openid+email"));
        assert!(url.ends_with("state=abc"));
    }

    #[test]
    fn parses_openid_profile() {
        let profile = parse_profile(&json!({
            "sub": "1234",
            "email": "dreamer@test.com",
            "name": "Dreamer",
            "picture": "https://img.test/a.png"
        }))
        .unwrap();
        assert_eq!(profile.account_id, "1234");
        assert_eq!(profile.email.as_deref(), Some("dreamer@test.com"));
        assert_eq!(profile.image.as_deref(), Some("https://img.test/a.png"));
    }

    #[test]
    fn parses_github_profile() {
        let profile = parse_profile(&json!({
            "id": 42,
            "login": "octo",
            "email": null,
            "avatar_url": "https://avatars.test/42"
        }))
        .unwrap();
        assert_eq!(profile.account_id, "42");
        assert_eq!(profile.name.as_deref(), Some("octo"));
        assert!(profile.email.is_none());
    }

    #[test]
    fn profile_without_id_is_rejected() {
        assert!(parse_profile(&json!({ "email": "x@test.com" })).is_none());
    }
}
