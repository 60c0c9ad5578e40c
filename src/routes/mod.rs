pub mod ai;
pub mod auth;
pub mod dreams;
pub mod images;
pub mod oauth;
pub mod preferences;
pub mod tags;

use axum::routing::{get, post};
use axum::{Json, Router};
use axum_extra::extract::WithRejection;

use crate::error::AppError;
use crate::state::SharedState;

/// JSON body whose parse failures come back as the standard error body.
pub type JsonBody<T> = WithRejection<Json<T>, AppError>;

pub fn api_routes() -> Router<SharedState> {
    Router::new()
        // Auth
        .route("/api/v1/auth/register", post(auth::register))
        .route("/api/v1/auth/login", post(auth::login))
        .route("/api/v1/auth/refresh", post(auth::refresh))
        .route("/api/v1/auth/logout", post(auth::logout))
        .route("/api/v1/auth/session", get(auth::session))
        .route("/api/v1/auth/forgot-password", post(auth::forgot_password))
        .route("/api/v1/auth/reset-password", post(auth::reset_password))
        .route("/api/v1/auth/change-password", post(auth::change_password))
        .route("/api/v1/auth/oauth/{provider}", get(oauth::authorize))
        .route("/api/v1/auth/oauth/{provider}/callback", get(oauth::callback))
        // Dreams
        .route("/api/v1/dreams", get(dreams::list).post(dreams::create))
        .route(
            "/api/v1/dreams/{id}",
            get(dreams::get).put(dreams::update).delete(dreams::delete),
        )
        .route("/api/v1/dreams/{id}/images", get(images::list_by_dream))
        .route("/api/v1/dreams/{id}/interpret", post(ai::interpret_dream))
        // Images
        .route("/api/v1/images", get(images::list).post(images::create))
        .route(
            "/api/v1/images/{id}",
            get(images::get).delete(images::delete),
        )
        // Tags
        .route("/api/v1/tags", get(tags::list))
        .route("/api/v1/tags/appearances", post(tags::record))
        // Preferences
        .route(
            "/api/v1/preferences/model",
            get(preferences::get).put(preferences::update),
        )
        // Generative model
        .route("/api/v1/ai/generate", post(ai::generate))
        .route("/api/v1/ai/suggest-tags", post(ai::suggest_tags))
        .route("/api/v1/ai/image", post(ai::generate_image))
}
