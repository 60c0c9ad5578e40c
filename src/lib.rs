pub mod ai;
pub mod auth;
pub mod client_ip;
pub mod config;
pub mod db;
pub mod email;
pub mod error;
pub mod maintenance;
pub mod middleware;
pub mod models;
pub mod rate_limit;
pub mod routes;
pub mod state;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderName, HeaderValue};
use axum::Router;
use sqlx::PgPool;
use tower::ServiceBuilder;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::ai::gemini::GeminiClient;
use crate::ai::GenerativeModel;
use crate::config::Config;
use crate::email::SystemMailer;
use crate::middleware::origin_check::require_trusted_origin;
use crate::middleware::session_gate::gate_pages;
use crate::rate_limit::{
    LoginRateLimiter, RECOVERY_REQUESTS_PER_CLIENT, RECOVERY_WINDOW, RESET_MAILS_PER_ADDRESS,
    RESET_MAIL_WINDOW, RequestRateLimiter,
};
use crate::state::{AppState, SharedState};

pub fn build_app(pool: PgPool, config: Config) -> Router {
    router(build_state(pool, config))
}

/// Shared state backed by the Gemini API.
pub fn build_state(pool: PgPool, config: Config) -> SharedState {
    let model = Arc::new(GeminiClient::new(&config.ai));
    build_state_with_model(pool, config, model)
}

pub fn build_state_with_model(
    pool: PgPool,
    config: Config,
    ai: Arc<dyn GenerativeModel>,
) -> SharedState {
    let system_mailer = config.smtp.as_ref().and_then(|smtp| {
        match SystemMailer::new(smtp) {
            Ok(mailer) => {
                tracing::info!("System SMTP configured");
                Some(Arc::new(mailer))
            }
            Err(e) => {
                tracing::warn!("System SMTP not available: {e}");
                None
            }
        }
    });

    if config.ai.api_key.is_none() {
        tracing::warn!("No Gemini API key configured; generation requests will fail");
    }

    Arc::new(AppState {
        pool,
        config,
        ai,
        http: reqwest::Client::new(),
        system_mailer,
        login_limiter: LoginRateLimiter::new(),
        recovery_limiter: RequestRateLimiter::new(RECOVERY_REQUESTS_PER_CLIENT, RECOVERY_WINDOW),
        reset_mail_limiter: RequestRateLimiter::new(RESET_MAILS_PER_ADDRESS, RESET_MAIL_WINDOW),
    })
}

pub fn router(state: SharedState) -> Router {
    let static_dir = &state.config.static_dir;
    let pages = ServeDir::new(static_dir)
        .fallback(ServeFile::new(format!("{static_dir}/index.html")));
    let body_limit = state.config.max_body_size;

    Router::new()
        .merge(routes::api_routes())
        .route("/health", axum::routing::get(health))
        .fallback_service(pages)
        .layer(
            ServiceBuilder::new()
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                        .on_response(DefaultOnResponse::new().level(Level::INFO)),
                )
                .layer(SetResponseHeaderLayer::overriding(
                    HeaderName::from_static("x-content-type-options"),
                    HeaderValue::from_static("nosniff"),
                ))
                .layer(SetResponseHeaderLayer::overriding(
                    HeaderName::from_static("x-frame-options"),
                    HeaderValue::from_static("DENY"),
                ))
                .layer(SetResponseHeaderLayer::overriding(
                    HeaderName::from_static("referrer-policy"),
                    HeaderValue::from_static("strict-origin-when-cross-origin"),
                ))
                .layer(DefaultBodyLimit::max(body_limit))
                .layer(axum::middleware::from_fn_with_state(
                    state.clone(),
                    require_trusted_origin,
                ))
                .layer(axum::middleware::from_fn_with_state(state.clone(), gate_pages))
                // Innermost: the middlewares above expect an unwrapped body
                .layer(RequestBodyLimitLayer::new(body_limit)),
        )
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}
