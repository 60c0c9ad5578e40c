//! Cross-site request check for state-changing requests.
//!
//! Browsers attach `Origin` (or at least `Referer`) to cross-site POSTs, so a
//! request is accepted when that header names this service or a configured
//! trusted origin. Forwarded host headers are honoured only from trusted
//! proxies, and request headers are never rewritten.

use std::net::{IpAddr, SocketAddr};

use axum::extract::{ConnectInfo, Request, State};
use axum::http::{HeaderMap, Method};
use axum::middleware::Next;
use axum::response::Response;
use ipnet::IpNet;

use crate::error::AppError;
use crate::state::SharedState;

pub async fn require_trusted_origin(
    State(state): State<SharedState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    if is_safe_method(req.method()) {
        return Ok(next.run(req).await);
    }

    let Some(source) = request_source(req.headers()) else {
        // Not a browser; there is no ambient cookie context to abuse.
        return Ok(next.run(req).await);
    };

    let peer = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip());
    let host = request_host(req.headers(), peer, &state.config.trusted_proxies);

    let mut trusted = Vec::with_capacity(state.config.trusted_origins.len() + 1);
    if let Some(base) = origin_of(&state.config.base_url) {
        trusted.push(base);
    }
    trusted.extend(state.config.trusted_origins.iter().cloned());

    if is_trusted(&source, host.as_deref(), &trusted) {
        Ok(next.run(req).await)
    } else {
        tracing::warn!(
            origin = %source,
            method = %req.method(),
            path = %req.uri().path(),
            "Rejected cross-site request"
        );
        Err(AppError::Forbidden("Cross-site request rejected".to_string()))
    }
}

fn is_safe_method(method: &Method) -> bool {
    matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS | Method::TRACE)
}

/// The origin a browser reported for this request: `Origin`, else the origin of `Referer`.
/// An opaque `null` origin is kept so it fails the trust check.
fn request_source(headers: &HeaderMap) -> Option<String> {
    if let Some(origin) = headers.get("origin").and_then(|v| v.to_str().ok()) {
        return Some(origin.trim().to_string());
    }
    headers
        .get("referer")
        .and_then(|v| v.to_str().ok())
        .and_then(origin_of)
}

/// Host this request was addressed to. `X-Forwarded-Host` counts only when the
/// direct peer is a trusted proxy.
fn request_host(headers: &HeaderMap, peer: Option<IpAddr>, trusted_proxies: &[IpNet]) -> Option<String> {
    let from_proxy = peer.is_some_and(|ip| trusted_proxies.iter().any(|net| net.contains(&ip)));

    let forwarded = from_proxy
        .then(|| headers.get("x-forwarded-host").and_then(|v| v.to_str().ok()))
        .flatten()
        .and_then(|v| v.split(',').next())
        .map(str::trim);

    forwarded
        .or_else(|| headers.get("host").and_then(|v| v.to_str().ok()))
        .map(|h| h.to_ascii_lowercase())
}

/// `scheme://host[:port]` of a URL, lower-cased.
fn origin_of(url: &str) -> Option<String> {
    let (scheme, rest) = url.trim().split_once("://")?;
    let authority = rest.split(['/', '?', '#']).next()?;
    if scheme.is_empty() || authority.is_empty() {
        return None;
    }
    Some(format!("{}://{}", scheme.to_ascii_lowercase(), authority.to_ascii_lowercase()))
}

fn is_trusted(source: &str, host: Option<&str>, trusted_origins: &[String]) -> bool {
    let Some(source) = origin_of(source) else {
        return false;
    };

    if trusted_origins
        .iter()
        .filter_map(|t| origin_of(t))
        .any(|t| t == source)
    {
        return true;
    }

    // Same-origin: compare authorities, as TLS may terminate in front of us.
    match (host, source.split_once("://")) {
        (Some(host), Some((_, authority))) => authority == host,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(&'static str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (k, v) in pairs {
            map.insert(*k, HeaderValue::from_str(v).unwrap());
        }
        map
    }

    #[test]
    fn origin_of_strips_path_and_case() {
        assert_eq!(
            origin_of("HTTPS://Dreams.Example.com:8443/api/v1?x=1").as_deref(),
            Some("https://dreams.example.com:8443")
        );
        assert_eq!(origin_of("null"), None);
    }

    #[test]
    fn same_host_is_trusted() {
        assert!(is_trusted("http://10.0.0.5:3000", Some("10.0.0.5:3000"), &[]));
        assert!(!is_trusted("http://evil.test", Some("10.0.0.5:3000"), &[]));
    }

    #[test]
    fn configured_origin_is_trusted() {
        let trusted = vec!["https://app.dreams.test/".to_string()];
        assert!(is_trusted("https://app.dreams.test", Some("api.internal"), &trusted));
        assert!(!is_trusted("http://app.dreams.test", Some("api.internal"), &trusted));
    }

    #[test]
    fn null_origin_is_rejected() {
        assert!(!is_trusted("null", Some("localhost:3000"), &[]));
    }

    #[test]
    fn referer_used_when_origin_missing() {
        let h = headers(&[("referer", "http://localhost:3000/dreams/4")]);
        assert_eq!(request_source(&h).as_deref(), Some("http://localhost:3000"));
    }

    #[test]
    fn forwarded_host_needs_trusted_peer() {
        let h = headers(&[("host", "127.0.0.1:3000"), ("x-forwarded-host", "dreams.test")]);
        let proxies: Vec<IpNet> = vec!["10.0.0.0/8".parse().unwrap()];

        let via_proxy = request_host(&h, Some("10.1.2.3".parse().unwrap()), &proxies);
        assert_eq!(via_proxy.as_deref(), Some("dreams.test"));

        let direct = request_host(&h, Some("192.168.1.9".parse().unwrap()), &proxies);
        assert_eq!(direct.as_deref(), Some("127.0.0.1:3000"));
    }
}
