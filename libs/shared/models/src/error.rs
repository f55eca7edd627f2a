use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;

use crate::scheduling::{AppointmentStatus, SlotTime};

/// Typed scheduling failures. Every rejected mutation leaves state unchanged;
/// none of these are retried by the core.
#[derive(Debug, Clone, Serialize, Deserialize, Error, PartialEq)]
pub enum SchedulingError {
    #[error("Slot {time} on {date} is no longer available")]
    SlotUnavailable { date: NaiveDate, time: SlotTime },

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Operation not allowed in status '{status}'")]
    InvalidState { status: AppointmentStatus },

    #[error("Validation error: {0}")]
    Validation(String),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not Found: {0}")]
    NotFound(String),

    #[error("Bad Request: {0}")]
    BadRequest(String),

    #[error("Internal Server Error: {0}")]
    Internal(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Conflict: {0}")]
    Conflict(String),
}

impl From<SchedulingError> for AppError {
    fn from(err: SchedulingError) -> Self {
        match &err {
            SchedulingError::SlotUnavailable { .. } => AppError::Conflict(err.to_string()),
            SchedulingError::Conflict(_) => AppError::Conflict(err.to_string()),
            SchedulingError::NotFound(_) => AppError::NotFound(err.to_string()),
            SchedulingError::InvalidState { .. } => AppError::Conflict(err.to_string()),
            SchedulingError::Validation(_) => AppError::ValidationError(err.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            AppError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
        };

        tracing::error!("Error: {}: {}", status, message);

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}
