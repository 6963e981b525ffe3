//! HTTP handlers for the payment API.

use std::collections::HashMap;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Form, Json, Router,
};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::booking::responses::BookingResponse;
use crate::error::{AppError, Result};
use crate::AppState;

use super::requests::{InitiatePaymentRequest, VerifyPaymentRequest};
use super::responses::PaymentLogResponse;
use super::{queries, services};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/payments/initiate", post(initiate))
        .route("/payments/verify", post(verify))
        .route("/payments/callback", post(callback))
        .route("/bookings/:id/payments", get(history))
}

async fn initiate(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<InitiatePaymentRequest>,
) -> Result<(StatusCode, Json<PaymentLogResponse>)> {
    let entry = services::initiate(&state.db, req.booking_id, user.id).await?;
    Ok((StatusCode::CREATED, Json(entry.into())))
}

async fn verify(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<VerifyPaymentRequest>,
) -> Result<Json<BookingResponse>> {
    // The report itself is still cross-checked against the booking under
    // lock; the auth check only stops third parties probing bookings.
    let booking = crate::booking::queries::get_booking(&state.db, req.booking_id)
        .await?
        .ok_or(AppError::NotFound)?;
    if booking.user_id != user.id && !user.is_staff() {
        return Err(AppError::Forbidden("not your booking".into()));
    }

    // A client that quotes its gateway order id settles that exact attempt.
    let payment_log_id = match req.gateway_order_id.as_deref() {
        Some(order_id) => queries::find_by_order_id(&state.db, order_id)
            .await?
            .map(|log| log.id),
        None => None,
    };

    let updated = services::verify(
        &state.db,
        &state.notifier,
        services::PaymentReport {
            booking_id: req.booking_id,
            payment_log_id,
            gateway_transaction_id: req.gateway_transaction_id,
            amount: req.amount,
            success: req.success,
            failure_reason: req.failure_reason,
            gateway_response: None,
        },
    )
    .await?;

    Ok(Json(updated.into()))
}

/// Server-to-server gateway callback. Unauthenticated by design: the
/// gateway is matched on the order id it was issued.
async fn callback(
    State(state): State<AppState>,
    Form(fields): Form<HashMap<String, String>>,
) -> Result<Json<BookingResponse>> {
    let booking = services::handle_callback(&state.db, &state.notifier, fields).await?;
    Ok(Json(booking.into()))
}

async fn history(
    State(state): State<AppState>,
    user: AuthUser,
    Path(booking_id): Path<Uuid>,
) -> Result<Json<Vec<PaymentLogResponse>>> {
    let booking = crate::booking::queries::get_booking(&state.db, booking_id)
        .await?
        .ok_or(AppError::NotFound)?;
    if booking.user_id != user.id && !user.is_staff() {
        return Err(AppError::Forbidden("not your booking".into()));
    }

    let entries = queries::list_for_booking(&state.db, booking_id).await?;
    Ok(Json(entries.into_iter().map(Into::into).collect()))
}
