#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

use dreamvault::ai::{AiError, GenerationRequest, GenerativeModel, ImageData, ImageRequest};
use dreamvault::config::{AiConfig, Config, RegistrationMode};
use dreamvault::state::SharedState;

/// Stand-in model: returns whatever the test scripted and remembers what it was asked.
pub struct StubModel {
    pub text_reply: Mutex<Result<String, String>>,
    pub image_reply: Mutex<Result<ImageData, String>>,
    pub last_text: Mutex<Option<GenerationRequest>>,
    pub last_image: Mutex<Option<ImageRequest>>,
}

impl StubModel {
    pub fn new() -> Self {
        Self {
            text_reply: Mutex::new(Ok("A quiet dream.".to_string())),
            image_reply: Mutex::new(Ok(ImageData {
                mime_type: "image/png".to_string(),
                data: "aW1hZ2U=".to_string(),
            })),
            last_text: Mutex::new(None),
            last_image: Mutex::new(None),
        }
    }

    pub fn reply_with(&self, text: &str) {
        *self.text_reply.lock().unwrap() = Ok(text.to_string());
    }

    pub fn fail_with(&self, message: &str) {
        *self.text_reply.lock().unwrap() = Err(message.to_string());
        *self.image_reply.lock().unwrap() = Err(message.to_string());
    }

    pub fn last_text_request(&self) -> GenerationRequest {
        self.last_text.lock().unwrap().clone().expect("no text request recorded")
    }

    pub fn last_image_request(&self) -> ImageRequest {
        self.last_image.lock().unwrap().clone().expect("no image request recorded")
    }
}

#[async_trait]
impl GenerativeModel for StubModel {
    fn provider(&self) -> &str {
        "stub"
    }

    async fn generate_text(&self, request: &GenerationRequest) -> Result<String, AiError> {
        *self.last_text.lock().unwrap() = Some(request.clone());
        self.text_reply.lock().unwrap().clone().map_err(AiError::from)
    }

    async fn generate_image(&self, request: &ImageRequest) -> Result<ImageData, AiError> {
        *self.last_image.lock().unwrap() = Some(request.clone());
        self.image_reply.lock().unwrap().clone().map_err(AiError::from)
    }
}

/// A running test server instance with a dedicated test database.
pub struct TestApp {
    pub addr: SocketAddr,
    pub pool: PgPool,
    pub client: Client,
    pub db_name: String,
    pub model: Arc<StubModel>,
    pub state: SharedState,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub async fn register(&self, email: &str, password: &str, name: &str) -> (Value, StatusCode) {
        let resp = self
            .client
            .post(self.url("/api/v1/auth/register"))
            .json(&json!({ "email": email, "password": password, "name": name }))
            .send()
            .await
            .expect("register request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    pub async fn login(&self, email: &str, password: &str) -> (Value, StatusCode) {
        let resp = self
            .client
            .post(self.url("/api/v1/auth/login"))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .expect("login request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    /// Register a user and return (access token, user id).
    pub async fn signup(&self, email: &str) -> (String, Uuid) {
        let (body, status) = self.register(email, "password123", "Dreamer").await;
        assert_eq!(status, StatusCode::OK, "register failed: {body}");
        let token = body["access_token"].as_str().unwrap().to_string();
        let id = body["user"]["id"].as_str().unwrap().parse().unwrap();
        (token, id)
    }

    pub async fn post_json(&self, path: &str, body: &Value) -> (Value, StatusCode) {
        let resp = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .expect("post request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    /// Create a dream, return the dream JSON.
    pub async fn create_dream(&self, token: &str, title: &str, tags: &[&str]) -> Value {
        let (body, status) = self
            .post_auth(
                "/api/v1/dreams",
                token,
                &json!({ "title": title, "content": "I was flying over a lake.", "tags": tags }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "create dream failed: {body}");
        body
    }

    pub async fn get_auth(&self, path: &str, token: &str) -> (Value, StatusCode) {
        let resp = self
            .client
            .get(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .expect("get request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    pub async fn post_auth(&self, path: &str, token: &str, body: &Value) -> (Value, StatusCode) {
        let resp = self
            .client
            .post(self.url(path))
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .expect("post request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    pub async fn put_auth(&self, path: &str, token: &str, body: &Value) -> (Value, StatusCode) {
        let resp = self
            .client
            .put(self.url(path))
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .expect("put request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    pub async fn delete_auth(&self, path: &str, token: &str) -> (Value, StatusCode) {
        let resp = self
            .client
            .delete(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .expect("delete request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    /// Current password hash stored for a user.
    pub async fn password_hash(&self, user_id: Uuid) -> Option<String> {
        sqlx::query_scalar("SELECT password_hash FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
            .unwrap()
    }

    pub async fn reset_token_count(&self, user_id: Uuid) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM password_reset_tokens WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
            .unwrap()
    }
}

fn admin_url(base_url: &str) -> String {
    base_url
        .rsplit_once('/')
        .map(|(base, _)| format!("{base}/postgres"))
        .unwrap_or_else(|| base_url.to_string())
}

/// Spawn a test app with a fresh temporary database.
pub async fn spawn_app() -> TestApp {
    spawn_app_with(|_| {}).await
}

/// Like [`spawn_app`], letting the test adjust configuration first.
pub async fn spawn_app_with(configure: impl FnOnce(&mut Config)) -> TestApp {
    let _ = dotenvy::dotenv();

    let base_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for tests");

    let db_name = format!("dreamvault_test_{}", Uuid::now_v7().to_string().replace('-', ""));

    let admin_pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&admin_url(&base_url))
        .await
        .expect("Failed to connect to postgres for test DB creation");

    sqlx::query(&format!("CREATE DATABASE \"{db_name}\""))
        .execute(&admin_pool)
        .await
        .expect("Failed to create test database");

    admin_pool.close().await;

    let test_url = base_url
        .rsplit_once('/')
        .map(|(base, _)| format!("{base}/{db_name}"))
        .unwrap_or_else(|| base_url.clone());

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&test_url)
        .await
        .expect("Failed to connect to test database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations on test database");

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind to random port");
    let addr = listener.local_addr().unwrap();

    let mut config = Config {
        database_url: test_url,
        jwt_secret: "test-jwt-secret-that-is-long-enough".to_string(),
        host: "127.0.0.1".parse().unwrap(),
        port: addr.port(),
        base_url: format!("http://{addr}"),
        registration: RegistrationMode::Open,
        max_body_size: 1_048_576,
        trusted_proxies: vec![],
        trusted_origins: vec![],
        static_dir: "public".to_string(),
        log_level: "warn".to_string(),
        smtp: None,
        ai: AiConfig::default(),
        oauth: vec![],
    };
    configure(&mut config);

    let model = Arc::new(StubModel::new());
    let state = dreamvault::build_state_with_model(pool.clone(), config, model.clone());
    let app = dreamvault::router(state.clone());

    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .expect("Server failed");
    });

    let client = Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap();

    TestApp {
        addr,
        pool,
        client,
        db_name,
        model,
        state,
    }
}

/// Drop the test database after tests complete.
pub async fn cleanup(app: TestApp) {
    let db_name = app.db_name.clone();
    app.pool.close().await;

    let base_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for tests");

    let admin_pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&admin_url(&base_url))
        .await
        .expect("Failed to connect for cleanup");

    let _ = sqlx::query(&format!("DROP DATABASE IF EXISTS \"{db_name}\" WITH (FORCE)"))
        .execute(&admin_pool)
        .await;

    admin_pool.close().await;
}
