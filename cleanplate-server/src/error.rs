// cleanplate-server/src/error.rs

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::error;

use cleanplate_core::Error;

/// Wire-side wrapper mapping the core error taxonomy onto HTTP statuses.
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        ApiError(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self.0 {
            Error::Validation(message) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "message": message }))).into_response()
            }
            Error::NotFound(message) => {
                (StatusCode::NOT_FOUND, Json(json!({ "message": message }))).into_response()
            }
            Error::Conflict(message) => {
                (StatusCode::CONFLICT, Json(json!({ "message": message }))).into_response()
            }
            Error::RateLimited { next_available_at } => (
                StatusCode::TOO_MANY_REQUESTS,
                Json(json!({
                    "message": "Scan limit reached. You can only scan once every 24 hours.",
                    "nextAvailableAt": next_available_at,
                })),
            )
                .into_response(),
            other => {
                error!("internal error serving request: {:?}", other);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "message": "Internal server error." })),
                )
                    .into_response()
            }
        }
    }
}
