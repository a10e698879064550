//! Liveness endpoints.

use axum::Json;

use crate::models::{MessageResponse, StatusResponse};

/// `GET /`: greeting.
pub async fn root() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: "Hello world!".into(),
    })
}

/// `GET /health`, `GET /healthz`: process is up.
pub async fn health() -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "ok".into(),
    })
}
