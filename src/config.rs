use std::net::IpAddr;

use ipnet::IpNet;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub host: IpAddr,
    pub port: u16,
    pub base_url: String,
    pub registration: RegistrationMode,
    pub max_body_size: usize,
    pub trusted_proxies: Vec<IpNet>,
    pub trusted_origins: Vec<String>,
    pub static_dir: String,
    pub log_level: String,
    pub smtp: Option<SmtpConfig>,
    pub ai: AiConfig,
    pub oauth: Vec<OAuthProviderConfig>,
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub pass: String,
    pub from: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RegistrationMode {
    Open,
    Closed,
}

/// Generative model settings. Request parameters and per-user preferences
/// override the defaults here.
#[derive(Debug, Clone)]
pub struct AiConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub default_model: String,
    pub image_model: String,
    pub default_temperature: f64,
    pub default_max_tokens: i32,
    pub timeout_secs: u64,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            default_model: "gemini-2.0-flash".to_string(),
            image_model: "gemini-2.0-flash-preview-image-generation".to_string(),
            default_temperature: 1.0,
            default_max_tokens: 2048,
            timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone)]
pub struct OAuthProviderConfig {
    pub name: String,
    pub client_id: String,
    pub client_secret: String,
    pub authorize_url: String,
    pub token_url: String,
    pub userinfo_url: String,
    pub scopes: String,
}

struct ProviderDefaults {
    name: &'static str,
    authorize_url: &'static str,
    token_url: &'static str,
    userinfo_url: &'static str,
    scopes: &'static str,
}

const KNOWN_PROVIDERS: &[ProviderDefaults] = &[
    ProviderDefaults {
        name: "google",
        authorize_url: "https://accounts.google.com/o/oauth2/v2/auth",
        token_url: "https://oauth2.googleapis.com/token",
        userinfo_url: "https://openidconnect.googleapis.com/v1/userinfo",
        scopes: "openid email profile",
    },
    ProviderDefaults {
        name: "github",
        authorize_url: "https://github.com/login/oauth/authorize",
        token_url: "https://github.com/login/oauth/access_token",
        userinfo_url: "https://api.github.com/user",
        scopes: "read:user user:email",
    },
];

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let database_url = env_required("DATABASE_URL")?;
        let jwt_secret = env_required("JWT_SECRET")?;

        let host: IpAddr = env_or("DREAMVAULT_HOST", "0.0.0.0")
            .parse()
            .map_err(|e| format!("Invalid DREAMVAULT_HOST: {e}"))?;

        let port: u16 = env_or("DREAMVAULT_PORT", "3000")
            .parse()
            .map_err(|e| format!("Invalid DREAMVAULT_PORT: {e}"))?;

        let base_url = env_or("DREAMVAULT_BASE_URL", &format!("http://{host}:{port}"))
            .trim_end_matches('/')
            .to_string();

        let registration = match env_or("DREAMVAULT_REGISTRATION", "open").as_str() {
            "closed" => RegistrationMode::Closed,
            _ => RegistrationMode::Open,
        };

        // Base64 image payloads are stored through the API, so the default is generous.
        let max_body_size: usize = env_or("DREAMVAULT_MAX_BODY_SIZE", "10485760")
            .parse()
            .map_err(|e| format!("Invalid DREAMVAULT_MAX_BODY_SIZE: {e}"))?;

        let trusted_proxies: Vec<IpNet> = split_list(&env_or("DREAMVAULT_TRUSTED_PROXIES", ""))
            .map(|s| {
                s.parse()
                    .map_err(|e| format!("Invalid DREAMVAULT_TRUSTED_PROXIES entry '{s}': {e}"))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let trusted_origins: Vec<String> = split_list(&env_or("DREAMVAULT_TRUSTED_ORIGINS", ""))
            .map(|s| s.trim_end_matches('/').to_string())
            .collect();

        let static_dir = env_or("DREAMVAULT_STATIC_DIR", "public");
        let log_level = env_or("DREAMVAULT_LOG_LEVEL", "info");

        let smtp = match (
            std::env::var("DREAMVAULT_SMTP_HOST").ok(),
            std::env::var("DREAMVAULT_SMTP_PORT").ok(),
            std::env::var("DREAMVAULT_SMTP_USER").ok(),
            std::env::var("DREAMVAULT_SMTP_PASS").ok(),
            std::env::var("DREAMVAULT_SMTP_FROM").ok(),
        ) {
            (Some(host), Some(port), Some(user), Some(pass), Some(from)) => Some(SmtpConfig {
                host,
                port: port
                    .parse()
                    .map_err(|e| format!("Invalid DREAMVAULT_SMTP_PORT: {e}"))?,
                user,
                pass,
                from,
            }),
            _ => None,
        };

        let defaults = AiConfig::default();
        let ai = AiConfig {
            api_key: std::env::var("GEMINI_API_KEY").ok().filter(|k| !k.is_empty()),
            base_url: env_or("DREAMVAULT_GEMINI_BASE_URL", &defaults.base_url)
                .trim_end_matches('/')
                .to_string(),
            default_model: env_or("DREAMVAULT_DEFAULT_MODEL", &defaults.default_model),
            image_model: env_or("DREAMVAULT_IMAGE_MODEL", &defaults.image_model),
            default_temperature: defaults.default_temperature,
            default_max_tokens: defaults.default_max_tokens,
            timeout_secs: env_or("DREAMVAULT_AI_TIMEOUT_SECS", "60")
                .parse()
                .map_err(|e| format!("Invalid DREAMVAULT_AI_TIMEOUT_SECS: {e}"))?,
        };

        let oauth = KNOWN_PROVIDERS
            .iter()
            .filter_map(oauth_provider_from_env)
            .collect();

        Ok(Config {
            database_url,
            jwt_secret,
            host,
            port,
            base_url,
            registration,
            max_body_size,
            trusted_proxies,
            trusted_origins,
            static_dir,
            log_level,
            smtp,
            ai,
            oauth,
        })
    }

    pub fn oauth_provider(&self, name: &str) -> Option<&OAuthProviderConfig> {
        self.oauth.iter().find(|p| p.name == name)
    }
}

/// A provider is enabled once both its client id and secret are set.
fn oauth_provider_from_env(defaults: &ProviderDefaults) -> Option<OAuthProviderConfig> {
    let prefix = format!("DREAMVAULT_OAUTH_{}", defaults.name.to_uppercase());
    let client_id = std::env::var(format!("{prefix}_CLIENT_ID")).ok()?;
    let client_secret = std::env::var(format!("{prefix}_CLIENT_SECRET")).ok()?;

    Some(OAuthProviderConfig {
        name: defaults.name.to_string(),
        client_id,
        client_secret,
        authorize_url: env_or(&format!("{prefix}_AUTHORIZE_URL"), defaults.authorize_url),
        token_url: env_or(&format!("{prefix}_TOKEN_URL"), defaults.token_url),
        userinfo_url: env_or(&format!("{prefix}_USERINFO_URL"), defaults.userinfo_url),
        scopes: env_or(&format!("{prefix}_SCOPES"), defaults.scopes),
    })
}

fn split_list(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(',').map(str::trim).filter(|s| !s.is_empty())
}

fn env_required(key: &str) -> Result<String, String> {
    std::env::var(key).map_err(|_| format!("Missing required environment variable: {key}"))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
