use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use contracts::shared::api_message::ApiMessage;
use serde_json::Value;

use crate::domain::a001_call_log::service::{self, IngestError};
use crate::routes::AppState;

const INVALID_FORMAT: &str = "Invalid data format. Expected an array of logs.";

/// GET /api/logs
pub async fn list_all(State(state): State<AppState>) -> Response {
    match service::list_all(&state.store).await {
        Ok(logs) => Json(logs).into_response(),
        Err(e) => error_response("Error fetching logs", e),
    }
}

/// POST /api/logs
///
/// Тело, которое не удалось разобрать как JSON (в том числе form-urlencoded),
/// считается неверным форматом. Превышение лимита размера отдаём как есть (413).
pub async fn ingest(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Response {
    let body = match payload {
        Ok(Json(body)) => body,
        Err(rejection) if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE => {
            return rejection.into_response();
        }
        Err(rejection) => {
            tracing::debug!("Rejected /api/logs body: {}", rejection.body_text());
            return error_response("Error saving logs", IngestError::InvalidFormat);
        }
    };

    match service::ingest(&state.store, body).await {
        Ok(outcome) if outcome.inserted > 0 => (
            StatusCode::CREATED,
            Json(ApiMessage::new(format!(
                "{} new logs saved successfully.",
                outcome.inserted
            ))),
        )
            .into_response(),
        Ok(_) => (StatusCode::OK, Json(ApiMessage::new("No new logs to save."))).into_response(),
        Err(e) => error_response("Error saving logs", e),
    }
}

fn error_response(context: &str, err: IngestError) -> Response {
    match err {
        IngestError::InvalidFormat => {
            (StatusCode::BAD_REQUEST, Json(ApiMessage::new(INVALID_FORMAT))).into_response()
        }
        IngestError::Validation { .. } => (
            StatusCode::BAD_REQUEST,
            Json(ApiMessage::with_error("Invalid log entry.", err.to_string())),
        )
            .into_response(),
        IngestError::Storage(ref e) => {
            tracing::error!("{}: {}", context, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiMessage::with_error(context, e.to_string())),
            )
                .into_response()
        }
    }
}
