//! Error handling for the booking core

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// What the requested window collided with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictKind {
    Booking,
    AvailabilityBlock,
}

impl ConflictKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConflictKind::Booking => "booking",
            ConflictKind::AvailabilityBlock => "availability_block",
        }
    }
}

/// Application error type
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Resource not found")]
    NotFound,

    #[error("Authentication required")]
    Unauthorized,

    #[error("Not authorized: {0}")]
    Forbidden(String),

    #[error("Invalid window: {0}")]
    InvalidWindow(String),

    #[error("Car not available (conflicting {})", .0.as_str())]
    AvailabilityConflict(ConflictKind),

    #[error("Payment amount does not match booking amount")]
    AmountMismatch,

    #[error("Booking is in {current} status")]
    UnexpectedBookingState { current: String },

    #[error("Booking has already started; cancellation window is closed")]
    CancellationWindowClosed,

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound => (StatusCode::NOT_FOUND, "NOT_FOUND", self.to_string()),
            AppError::Unauthorized => {
                (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", self.to_string())
            }
            AppError::Forbidden(_) => (StatusCode::FORBIDDEN, "FORBIDDEN", self.to_string()),
            AppError::InvalidWindow(_) => {
                (StatusCode::BAD_REQUEST, "INVALID_WINDOW", self.to_string())
            }
            AppError::AvailabilityConflict(_) => (
                StatusCode::CONFLICT,
                "AVAILABILITY_CONFLICT",
                self.to_string(),
            ),
            AppError::AmountMismatch => {
                // Hard error: possible tampering or stale quote, needs manual review.
                (StatusCode::CONFLICT, "AMOUNT_MISMATCH", self.to_string())
            }
            AppError::UnexpectedBookingState { .. } => (
                StatusCode::CONFLICT,
                "UNEXPECTED_BOOKING_STATE",
                self.to_string(),
            ),
            AppError::CancellationWindowClosed => (
                StatusCode::CONFLICT,
                "CANCELLATION_WINDOW_CLOSED",
                self.to_string(),
            ),
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", self.to_string()),
            AppError::Database(sqlx::Error::RowNotFound) => {
                (StatusCode::NOT_FOUND, "NOT_FOUND", "Resource not found".into())
            }
            AppError::Database(sqlx::Error::PoolTimedOut) => {
                tracing::warn!("database pool timed out");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "RETRYABLE",
                    "Database busy, retry later".into(),
                )
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DB_ERROR",
                    "Database error".into(),
                )
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL",
                    "Internal error".into(),
                )
            }
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflict_kind_names() {
        assert_eq!(ConflictKind::Booking.as_str(), "booking");
        assert_eq!(ConflictKind::AvailabilityBlock.as_str(), "availability_block");
    }

    #[test]
    fn availability_conflict_message_names_the_kind() {
        let err = AppError::AvailabilityConflict(ConflictKind::AvailabilityBlock);
        assert!(err.to_string().contains("availability_block"));
    }

    #[test]
    fn cancellation_window_closed_maps_to_conflict() {
        // Closed-window cancellations are a state conflict, not malformed
        // input, so callers can tell them apart from a 400.
        let resp = AppError::CancellationWindowClosed.into_response();
        assert_eq!(resp.status(), StatusCode::CONFLICT);

        let resp = AppError::BadRequest("bad".into()).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn unexpected_state_carries_current_status() {
        let err = AppError::UnexpectedBookingState {
            current: "CANCELLED".into(),
        };
        assert!(err.to_string().contains("CANCELLED"));
    }
}
