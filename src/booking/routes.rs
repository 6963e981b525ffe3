//! HTTP handlers for the booking API.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::error::{AppError, Result};
use crate::AppState;

use super::requests::{
    AvailabilityQuery, CancelBookingRequest, CreateBookingRequest, QuoteRequest,
    ReturnBookingRequest, ReviewRequest,
};
use super::responses::{AvailabilityResponse, BookingResponse, QuoteResponse, ReviewResponse};
use super::{queries, services};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/bookings", post(create).get(list_mine))
        .route("/bookings/quote", post(quote))
        .route("/bookings/:id", get(get_one))
        .route("/bookings/:id/cancel", post(cancel))
        .route("/bookings/:id/approve", post(approve))
        .route("/bookings/:id/pickup", post(pickup))
        .route("/bookings/:id/return", post(complete))
        .route("/bookings/:id/review", post(review))
        .route("/cars/:id/availability", get(availability))
}

async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<BookingResponse>)> {
    let booking = services::reserve(
        &state.db,
        services::ReserveRequest {
            car_id: req.car_id,
            user_id: user.id,
            start: req.start_time,
            end: req.end_time,
            coupon_id: req.coupon_id,
            discount: req.discount_amount,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(booking.into())))
}

async fn quote(
    State(state): State<AppState>,
    Json(req): Json<QuoteRequest>,
) -> Result<Json<QuoteResponse>> {
    let q = services::quote(
        &state.db,
        &state.cache,
        req.car_id,
        req.start_time,
        req.end_time,
        req.discount_amount,
    )
    .await?;

    Ok(Json(q.into()))
}

async fn availability(
    State(state): State<AppState>,
    Path(car_id): Path<Uuid>,
    Query(q): Query<AvailabilityQuery>,
) -> Result<Json<AvailabilityResponse>> {
    if q.start_time >= q.end_time {
        return Err(AppError::InvalidWindow(
            "start time must be before end time".into(),
        ));
    }
    let available =
        services::is_available(&state.db, car_id, q.start_time, q.end_time, None).await?;

    Ok(Json(AvailabilityResponse { car_id, available }))
}

async fn get_one(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<BookingResponse>> {
    let booking = queries::get_booking(&state.db, id)
        .await?
        .ok_or(AppError::NotFound)?;

    if booking.user_id != user.id && !user.is_staff() {
        return Err(AppError::Forbidden("not your booking".into()));
    }
    Ok(Json(booking.into()))
}

async fn list_mine(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<BookingResponse>>> {
    let bookings = queries::list_bookings_by_user(&state.db, user.id).await?;
    Ok(Json(bookings.into_iter().map(Into::into).collect()))
}

async fn cancel(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<CancelBookingRequest>,
) -> Result<Json<BookingResponse>> {
    let booking = services::cancel(
        &state.db,
        &state.notifier,
        id,
        user.id,
        user.is_staff(),
        &req.reason,
    )
    .await?;

    Ok(Json(booking.into()))
}

async fn approve(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<BookingResponse>> {
    user.require_staff()?;
    let booking = services::approve(&state.db, id).await?;
    Ok(Json(booking.into()))
}

async fn pickup(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<BookingResponse>> {
    user.require_staff()?;
    let booking = services::pickup(&state.db, id).await?;
    Ok(Json(booking.into()))
}

async fn complete(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<ReturnBookingRequest>,
) -> Result<Json<BookingResponse>> {
    user.require_staff()?;
    let booking = services::complete(&state.db, id, req.km_travelled).await?;
    Ok(Json(booking.into()))
}

async fn review(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<ReviewRequest>,
) -> Result<(StatusCode, Json<ReviewResponse>)> {
    let review_id = services::submit_review(
        &state.db,
        id,
        user.id,
        req.rating,
        req.review_text.as_deref(),
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(ReviewResponse {
            id: review_id,
            booking_id: id,
        }),
    ))
}
