use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

pub mod error;

pub mod config {
    pub mod settings;
}
pub mod api {
    pub mod vapi_client;
    pub mod vapi_dtos;
}
pub mod models {
    pub mod contact_models;
}
pub mod utils {
    pub mod callback_prompts;
    pub mod phone;
}
pub mod jobs {
    pub mod dispatcher;
}
pub mod handlers {
    pub mod webhook_handlers;
}

use config::settings::Settings;
use handlers::webhook_handlers;
use jobs::dispatcher::CallbackDispatcher;

pub struct AppState {
    pub settings: Settings,
    pub dispatcher: CallbackDispatcher,
}

async fn health_check() -> &'static str {
    "OK"
}

pub fn create_router(state: Arc<AppState>) -> Router {
    let webhook = post(webhook_handlers::zapier_webhook)
        .fallback(webhook_handlers::method_not_allowed);

    let callback = post(webhook_handlers::request_callback)
        .fallback(webhook_handlers::method_not_allowed);

    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/webhook", webhook.clone())
        .route("/api/zapier-webhook", webhook)
        .route("/api/callback", callback)
        .layer(
            ServiceBuilder::new()
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                        .on_response(DefaultOnResponse::new().level(Level::INFO)),
                )
                .layer(
                    CorsLayer::new()
                        .allow_methods([axum::http::Method::POST, axum::http::Method::OPTIONS])
                        .allow_origin(Any)
                        .allow_headers([axum::http::header::CONTENT_TYPE]),
                ),
        )
        .with_state(state)
}
