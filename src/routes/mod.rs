use crate::AppState;
use axum::routing::{get, post};
use axum::Router;

pub mod health;
pub mod qualification;

/// API router shared by the server binary and the integration tests.
/// Static file serving and the HTTP middleware layers are attached by
/// the binary.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/api/qualification/register", post(qualification::register))
        .route(
            "/api/qualification/status/:id",
            get(qualification::qualification_status),
        )
        .route(
            "/api/qualification/webhook/voice",
            get(qualification::voice_webhook),
        )
        .route(
            "/api/qualification/webhook/voice/response",
            get(qualification::voice_response_webhook),
        )
        .route(
            "/api/qualification/webhook/sms",
            post(qualification::inbound_message_webhook),
        )
        .route(
            "/api/qualification/webhook/assistant",
            post(qualification::assistant_webhook),
        )
        .with_state(state)
}
