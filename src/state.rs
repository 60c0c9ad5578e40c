use std::sync::Arc;

use sqlx::PgPool;

use crate::ai::GenerativeModel;
use crate::config::Config;
use crate::email::SystemMailer;
use crate::rate_limit::{LoginRateLimiter, RequestRateLimiter};

pub type SharedState = Arc<AppState>;

pub struct AppState {
    pub pool: PgPool,
    pub config: Config,
    pub ai: Arc<dyn GenerativeModel>,
    /// Plain client for OAuth token and profile requests.
    pub http: reqwest::Client,
    pub system_mailer: Option<Arc<SystemMailer>>,
    pub login_limiter: LoginRateLimiter,
    /// Forgot/reset password requests per client address.
    pub recovery_limiter: RequestRateLimiter,
    /// Reset emails per account address.
    pub reset_mail_limiter: RequestRateLimiter,
}
