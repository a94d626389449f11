// Shared HTTP response types for consistent API error payloads.

use crate::use_cases::{RegistryError, RoomError};
use axum::{Json, http::StatusCode};

#[derive(Debug, serde::Serialize)]
pub struct ErrorResponse {
    // Human-readable error string for consistent JSON error responses.
    pub error: String,
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);

pub fn error_response(status: StatusCode, error: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
        }),
    )
}

pub fn map_registry_error(err: RegistryError) -> ApiError {
    let status = match &err {
        RegistryError::RoomNotFound | RegistryError::ConnectionNotFound => StatusCode::NOT_FOUND,
        RegistryError::RoomExists
        | RegistryError::ConnectionBusy { .. }
        | RegistryError::NotSubscribed => StatusCode::CONFLICT,
        RegistryError::Room(room_err) => match room_err {
            RoomError::EmptyRoom
            | RoomError::NotIdle
            | RoomError::AlreadySubscribed
            | RoomError::NotSubscribed
            | RoomError::Spawn(_) => StatusCode::CONFLICT,
            RoomError::Saturated | RoomError::RoomClosed => StatusCode::SERVICE_UNAVAILABLE,
        },
    };
    error_response(status, err.to_string())
}
