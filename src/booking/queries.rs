//! Database queries for bookings and availability.
//!
//! All queries use runtime-checked sqlx with explicit binds. Functions that
//! participate in a locked transaction take a generic executor so they can
//! run against either the pool or an open transaction.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use crate::error::Result;
use crate::models::{Booking, BookingStatus, Car, PaymentStatus};

const BOOKING_COLUMNS: &str = r#"
    id, user_id, car_id, coupon_id,
    start_time, end_time, actual_start_time, actual_end_time,
    advance_amount, advance_amount_status, total_amount, deposit_amount,
    extra_hours_charge, extra_km_charge, km_travelled,
    refund_amount, refund_status, status,
    cancellation_reason, cancelled_by, cancelled_at,
    created_at, updated_at
"#;

/// Fetch an active car without locking (quote path; stale reads are fine).
pub async fn get_active_car(exec: impl PgExecutor<'_>, car_id: Uuid) -> Result<Option<Car>> {
    let car = sqlx::query_as::<_, Car>(
        r#"
        SELECT id, brand, car_model, active, base_price, damage_price,
               included_km_per_day, tariffs, created_at
        FROM cars
        WHERE id = $1 AND active = true
        "#,
    )
    .bind(car_id)
    .fetch_optional(exec)
    .await?;

    Ok(car)
}

/// Fetch an active car under an exclusive row lock. Serializes reservation
/// attempts for this car until the surrounding transaction ends.
pub async fn get_active_car_for_update(
    exec: impl PgExecutor<'_>,
    car_id: Uuid,
) -> Result<Option<Car>> {
    let car = sqlx::query_as::<_, Car>(
        r#"
        SELECT id, brand, car_model, active, base_price, damage_price,
               included_km_per_day, tariffs, created_at
        FROM cars
        WHERE id = $1 AND active = true
        FOR UPDATE
        "#,
    )
    .bind(car_id)
    .fetch_optional(exec)
    .await?;

    Ok(car)
}

/// First booking whose window overlaps `[start, end)` for this car, among
/// statuses that block availability. COMPLETED/CANCELLED never block.
pub async fn find_overlapping_booking(
    exec: impl PgExecutor<'_>,
    car_id: Uuid,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    exclude_booking_id: Option<Uuid>,
) -> Result<Option<Uuid>> {
    // Half-open overlap: existing.start < new.end AND existing.end > new.start
    let id = sqlx::query_scalar::<_, Uuid>(
        r#"
        SELECT id
        FROM bookings
        WHERE car_id = $1
          AND status IN ('PENDING', 'APPROVED', 'BOOKED', 'ONGOING')
          AND start_time < $3
          AND end_time > $2
          AND ($4::uuid IS NULL OR id <> $4)
        LIMIT 1
        "#,
    )
    .bind(car_id)
    .bind(start)
    .bind(end)
    .bind(exclude_booking_id)
    .fetch_optional(exec)
    .await?;

    Ok(id)
}

/// First staff availability block overlapping `[start, end)` for this car.
pub async fn find_overlapping_block(
    exec: impl PgExecutor<'_>,
    car_id: Uuid,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<Option<Uuid>> {
    let id = sqlx::query_scalar::<_, Uuid>(
        r#"
        SELECT id
        FROM availability_blocks
        WHERE car_id = $1
          AND start_date < $3
          AND end_date > $2
        LIMIT 1
        "#,
    )
    .bind(car_id)
    .bind(start)
    .bind(end)
    .fetch_optional(exec)
    .await?;

    Ok(id)
}

pub struct NewBooking {
    pub user_id: Uuid,
    pub car_id: Uuid,
    pub coupon_id: Option<Uuid>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub advance_amount: Decimal,
    pub total_amount: Decimal,
    pub deposit_amount: Decimal,
}

/// Insert a PENDING booking with advance status INITIATED.
pub async fn insert_booking(exec: impl PgExecutor<'_>, new: NewBooking) -> Result<Booking> {
    let sql = format!(
        r#"
        INSERT INTO bookings
            (id, user_id, car_id, coupon_id, start_time, end_time,
             advance_amount, advance_amount_status, total_amount, deposit_amount,
             status, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, 'INITIATED', $8, $9, 'PENDING', now(), now())
        RETURNING {BOOKING_COLUMNS}
        "#
    );

    let booking = sqlx::query_as::<_, Booking>(&sql)
        .bind(Uuid::new_v4())
        .bind(new.user_id)
        .bind(new.car_id)
        .bind(new.coupon_id)
        .bind(new.start_time)
        .bind(new.end_time)
        .bind(new.advance_amount)
        .bind(new.total_amount)
        .bind(new.deposit_amount)
        .fetch_one(exec)
        .await?;

    Ok(booking)
}

pub async fn get_booking(exec: impl PgExecutor<'_>, id: Uuid) -> Result<Option<Booking>> {
    let sql = format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = $1");
    let booking = sqlx::query_as::<_, Booking>(&sql)
        .bind(id)
        .fetch_optional(exec)
        .await?;

    Ok(booking)
}

/// Fetch a booking under an exclusive row lock (payment reconciliation and
/// cancellation serialize on this).
pub async fn get_booking_for_update(
    exec: impl PgExecutor<'_>,
    id: Uuid,
) -> Result<Option<Booking>> {
    let sql = format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = $1 FOR UPDATE");
    let booking = sqlx::query_as::<_, Booking>(&sql)
        .bind(id)
        .fetch_optional(exec)
        .await?;

    Ok(booking)
}

/// A user's bookings, newest first.
pub async fn list_bookings_by_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Booking>> {
    let sql = format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings WHERE user_id = $1 ORDER BY start_time DESC"
    );
    let bookings = sqlx::query_as::<_, Booking>(&sql)
        .bind(user_id)
        .fetch_all(pool)
        .await?;

    Ok(bookings)
}

/// Apply a plain status transition (approve path).
pub async fn update_status(
    exec: impl PgExecutor<'_>,
    id: Uuid,
    status: BookingStatus,
) -> Result<Booking> {
    let sql = format!(
        r#"
        UPDATE bookings
        SET status = $2, updated_at = now()
        WHERE id = $1
        RETURNING {BOOKING_COLUMNS}
        "#
    );
    let booking = sqlx::query_as::<_, Booking>(&sql)
        .bind(id)
        .bind(status)
        .fetch_one(exec)
        .await?;

    Ok(booking)
}

/// Pickup: ONGOING plus the actual start stamp (only if not already set).
pub async fn mark_ongoing(
    exec: impl PgExecutor<'_>,
    id: Uuid,
    actual_start: DateTime<Utc>,
) -> Result<Booking> {
    let sql = format!(
        r#"
        UPDATE bookings
        SET status = 'ONGOING',
            actual_start_time = COALESCE(actual_start_time, $2),
            updated_at = now()
        WHERE id = $1
        RETURNING {BOOKING_COLUMNS}
        "#
    );
    let booking = sqlx::query_as::<_, Booking>(&sql)
        .bind(id)
        .bind(actual_start)
        .fetch_one(exec)
        .await?;

    Ok(booking)
}

/// Return: COMPLETED with the actual end stamp and any computed charges.
pub async fn mark_completed(
    exec: impl PgExecutor<'_>,
    id: Uuid,
    actual_end: DateTime<Utc>,
    extra_hours_charge: Option<Decimal>,
    extra_km_charge: Option<Decimal>,
    km_travelled: Option<Decimal>,
) -> Result<Booking> {
    let sql = format!(
        r#"
        UPDATE bookings
        SET status = 'COMPLETED',
            actual_end_time = COALESCE(actual_end_time, $2),
            extra_hours_charge = $3,
            extra_km_charge = $4,
            km_travelled = $5,
            updated_at = now()
        WHERE id = $1
        RETURNING {BOOKING_COLUMNS}
        "#
    );
    let booking = sqlx::query_as::<_, Booking>(&sql)
        .bind(id)
        .bind(actual_end)
        .bind(extra_hours_charge)
        .bind(extra_km_charge)
        .bind(km_travelled)
        .fetch_one(exec)
        .await?;

    Ok(booking)
}

/// Cancellation: status, metadata and refund fields in one write.
#[allow(clippy::too_many_arguments)]
pub async fn mark_cancelled(
    exec: impl PgExecutor<'_>,
    id: Uuid,
    reason: &str,
    cancelled_by: Uuid,
    cancelled_at: DateTime<Utc>,
    refund_amount: Option<Decimal>,
    refund_status: Option<PaymentStatus>,
) -> Result<Booking> {
    let sql = format!(
        r#"
        UPDATE bookings
        SET status = 'CANCELLED',
            cancellation_reason = $2,
            cancelled_by = $3,
            cancelled_at = $4,
            refund_amount = $5,
            refund_status = $6,
            updated_at = now()
        WHERE id = $1
        RETURNING {BOOKING_COLUMNS}
        "#
    );
    let booking = sqlx::query_as::<_, Booking>(&sql)
        .bind(id)
        .bind(reason)
        .bind(cancelled_by)
        .bind(cancelled_at)
        .bind(refund_amount)
        .bind(refund_status)
        .fetch_one(exec)
        .await?;

    Ok(booking)
}

/// Settle the advance payment outcome on the booking row. A successful
/// outcome also promotes the booking to BOOKED; a failed one leaves the
/// booking status untouched so payment can be retried.
pub async fn settle_advance(
    exec: impl PgExecutor<'_>,
    id: Uuid,
    advance_status: PaymentStatus,
    promote_to_booked: bool,
) -> Result<Booking> {
    let sql = format!(
        r#"
        UPDATE bookings
        SET advance_amount_status = $2,
            status = CASE WHEN $3 THEN 'BOOKED'::booking_status ELSE status END,
            updated_at = now()
        WHERE id = $1
        RETURNING {BOOKING_COLUMNS}
        "#
    );
    let booking = sqlx::query_as::<_, Booking>(&sql)
        .bind(id)
        .bind(advance_status)
        .bind(promote_to_booked)
        .fetch_one(exec)
        .await?;

    Ok(booking)
}

/// Cancel PENDING bookings whose advance payment has not succeeded within
/// the hold TTL. Returns (booking_id, user_id) for each reaped row so the
/// caller can publish cancellation events.
pub async fn expire_stale_pending(
    pool: &PgPool,
    cutoff: DateTime<Utc>,
) -> Result<Vec<(Uuid, Uuid)>> {
    let reaped = sqlx::query_as::<_, (Uuid, Uuid)>(
        r#"
        UPDATE bookings
        SET status = 'CANCELLED',
            cancellation_reason = 'Checkout abandoned (hold expired)',
            cancelled_at = now(),
            updated_at = now()
        WHERE status = 'PENDING'
          AND advance_amount_status <> 'SUCCESSFUL'
          AND created_at < $1
        RETURNING id, user_id
        "#,
    )
    .bind(cutoff)
    .fetch_all(pool)
    .await?;

    Ok(reaped)
}

/// Whether this booking-user pair already has a review.
pub async fn review_exists(
    exec: impl PgExecutor<'_>,
    booking_id: Uuid,
    user_id: Uuid,
) -> Result<bool> {
    let id = sqlx::query_scalar::<_, Uuid>(
        "SELECT id FROM reviews WHERE booking_id = $1 AND user_id = $2 LIMIT 1",
    )
    .bind(booking_id)
    .bind(user_id)
    .fetch_optional(exec)
    .await?;

    Ok(id.is_some())
}

pub async fn insert_review(
    exec: impl PgExecutor<'_>,
    booking_id: Uuid,
    car_id: Uuid,
    user_id: Uuid,
    rating: i32,
    review_text: Option<&str>,
) -> Result<Uuid> {
    let id = sqlx::query_scalar::<_, Uuid>(
        r#"
        INSERT INTO reviews (id, booking_id, car_id, user_id, rating, review_text, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, now())
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(booking_id)
    .bind(car_id)
    .bind(user_id)
    .bind(rating)
    .bind(review_text)
    .fetch_one(exec)
    .await?;

    Ok(id)
}
