//! Booking orchestration: the reservation guard, lifecycle transitions,
//! cancellation/refund, and the hold reaper.
//!
//! Every state-mutating operation here runs inside a single transaction; on
//! any failure the whole operation rolls back. Locks are held only for the
//! duration of one check-plus-write, never across a network call.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use std::time::Duration as StdDuration;
use tokio::time::interval;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{AppError, ConflictKind, Result};
use crate::models::booking::statuses_compatible;
use crate::models::{Booking, BookingStatus, PaymentStatus};
use crate::notify::{BookingEvent, Notifier};

use super::calculators::{
    compute_quote, extra_hours_charge, extra_km_charge, rental_days, Quote,
};
use super::queries;

/// Reject zero-length or inverted windows before any lock is taken.
fn validate_window(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<()> {
    if start >= end {
        return Err(AppError::InvalidWindow(
            "start time must be before end time".into(),
        ));
    }
    Ok(())
}

/// Read-only availability check. Takes no lock; callers that are about to
/// reserve must re-check under the car-row lock (see [`reserve`]).
pub async fn is_available(
    pool: &PgPool,
    car_id: Uuid,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    exclude_booking_id: Option<Uuid>,
) -> Result<bool> {
    if queries::find_overlapping_booking(pool, car_id, start, end, exclude_booking_id)
        .await?
        .is_some()
    {
        return Ok(false);
    }
    Ok(queries::find_overlapping_block(pool, car_id, start, end)
        .await?
        .is_none())
}

/// Price estimation without creating anything. May read a cached car.
pub async fn quote(
    pool: &PgPool,
    cache: &crate::cache::AppCache,
    car_id: Uuid,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    discount: Option<Decimal>,
) -> Result<Quote> {
    validate_window(start, end)?;

    let car = match cache.get_car(car_id).await {
        Some(car) => car,
        None => {
            let car = queries::get_active_car(pool, car_id)
                .await?
                .ok_or(AppError::NotFound)?;
            cache.put_car(car.clone()).await;
            car
        }
    };

    Ok(compute_quote(
        car.price_per_day(),
        car.deposit(),
        start,
        end,
        discount,
    ))
}

pub struct ReserveRequest {
    pub car_id: Uuid,
    pub user_id: Uuid,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub coupon_id: Option<Uuid>,
    pub discount: Option<Decimal>,
}

/// The reservation guard: at most one booking may succeed for any
/// overlapping window on a given car.
///
/// The car row is locked first, then availability is checked inside the
/// same transaction, then the PENDING booking is inserted. Without the
/// lock, two concurrent requests could both read "no conflict" and both
/// insert. Locking per car keeps different cars fully concurrent.
pub async fn reserve(pool: &PgPool, req: ReserveRequest) -> Result<Booking> {
    validate_window(req.start, req.end)?;

    let mut tx = pool.begin().await?;

    let car = queries::get_active_car_for_update(&mut *tx, req.car_id)
        .await?
        .ok_or(AppError::NotFound)?;

    if queries::find_overlapping_booking(&mut *tx, car.id, req.start, req.end, None)
        .await?
        .is_some()
    {
        // Rolls back on drop; lock released without inserting anything.
        return Err(AppError::AvailabilityConflict(ConflictKind::Booking));
    }
    if queries::find_overlapping_block(&mut *tx, car.id, req.start, req.end)
        .await?
        .is_some()
    {
        return Err(AppError::AvailabilityConflict(ConflictKind::AvailabilityBlock));
    }

    // Price is computed once and stored; later reads never recompute from
    // mutable car pricing.
    let q = compute_quote(
        car.price_per_day(),
        car.deposit(),
        req.start,
        req.end,
        req.discount,
    );

    let booking = queries::insert_booking(
        &mut *tx,
        queries::NewBooking {
            user_id: req.user_id,
            car_id: car.id,
            coupon_id: req.coupon_id,
            start_time: req.start,
            end_time: req.end,
            advance_amount: q.advance_amount,
            total_amount: q.total_amount,
            deposit_amount: q.deposit_amount,
        },
    )
    .await?;

    tx.commit().await?;

    info!(booking_id = %booking.id, car_id = %car.id, total = %booking.total_amount,
        "booking reserved");
    Ok(booking)
}

/// Cancel a booking, computing any refund. Caller must be the booking's
/// customer or staff; preconditions: cancellable status, start strictly in
/// the future.
pub async fn cancel(
    pool: &PgPool,
    notifier: &Notifier,
    booking_id: Uuid,
    actor_id: Uuid,
    actor_is_staff: bool,
    reason: &str,
) -> Result<Booking> {
    let now = Utc::now();
    let mut tx = pool.begin().await?;

    let booking = queries::get_booking_for_update(&mut *tx, booking_id)
        .await?
        .ok_or(AppError::NotFound)?;

    if booking.user_id != actor_id && !actor_is_staff {
        return Err(AppError::Forbidden("not your booking".into()));
    }
    if !booking.status.is_cancellable() {
        return Err(AppError::UnexpectedBookingState {
            current: booking.status.as_str().into(),
        });
    }
    if booking.start_time <= now {
        return Err(AppError::CancellationWindowClosed);
    }

    // Refund only applies when the advance actually went through.
    let (refund_amount, refund_status) =
        if booking.advance_amount_status == PaymentStatus::Successful {
            let amount =
                super::calculators::refund_amount(booking.advance_amount, booking.start_time, now);
            (Some(amount), Some(PaymentStatus::RefundInitiated))
        } else {
            (None, None)
        };

    let cancelled = queries::mark_cancelled(
        &mut *tx,
        booking.id,
        reason,
        actor_id,
        now,
        refund_amount,
        refund_status,
    )
    .await?;

    if let Some(amount) = refund_amount {
        // Audit row; the actual fund transfer is an external async concern.
        crate::payments::queries::insert_payment_log(
            &mut *tx,
            cancelled.id,
            cancelled.user_id,
            amount,
            crate::models::PaymentType::Refund,
            PaymentStatus::Initiated,
        )
        .await?;
    }

    tx.commit().await?;

    info!(booking_id = %cancelled.id, refund = ?refund_amount, "booking cancelled");
    notifier.publish(BookingEvent::Cancelled {
        booking_id: cancelled.id,
        user_id: cancelled.user_id,
        refund_amount,
    });
    Ok(cancelled)
}

/// Staff pre-confirmation: PENDING -> APPROVED.
pub async fn approve(pool: &PgPool, booking_id: Uuid) -> Result<Booking> {
    transition(pool, booking_id, BookingStatus::Approved).await
}

/// Staff marks pickup done: APPROVED/BOOKED -> ONGOING.
pub async fn pickup(pool: &PgPool, booking_id: Uuid) -> Result<Booking> {
    let mut tx = pool.begin().await?;
    let booking = queries::get_booking_for_update(&mut *tx, booking_id)
        .await?
        .ok_or(AppError::NotFound)?;

    check_transition(&booking, BookingStatus::Ongoing)?;

    let updated = queries::mark_ongoing(&mut *tx, booking.id, Utc::now()).await?;
    tx.commit().await?;
    Ok(updated)
}

/// Staff marks return done: ONGOING -> COMPLETED, computing late-return and
/// over-allowance charges against the contractual window.
pub async fn complete(
    pool: &PgPool,
    booking_id: Uuid,
    km_travelled: Option<Decimal>,
) -> Result<Booking> {
    let now = Utc::now();
    let mut tx = pool.begin().await?;

    let booking = queries::get_booking_for_update(&mut *tx, booking_id)
        .await?
        .ok_or(AppError::NotFound)?;

    check_transition(&booking, BookingStatus::Completed)?;

    // The active flag only gates new reservations; a car deactivated
    // mid-rental must still settle its existing booking.
    let car = crate::fleet::queries::get_car(&mut *tx, booking.car_id)
        .await?
        .ok_or(AppError::NotFound)?;

    let actual_end = booking.actual_end_time.unwrap_or(now);
    let hours_charge = extra_hours_charge(car.hourly_rate(), booking.end_time, actual_end);
    let hours_charge = (hours_charge > Decimal::ZERO).then_some(hours_charge);

    let km_charge = km_travelled.map(|travelled| {
        let days = rental_days(booking.start_time, booking.end_time);
        extra_km_charge(car.extra_km_rate(), car.included_km_per_day, days, travelled)
    });
    let km_charge = km_charge.filter(|c| *c > Decimal::ZERO);

    let updated = queries::mark_completed(
        &mut *tx,
        booking.id,
        actual_end,
        hours_charge,
        km_charge,
        km_travelled,
    )
    .await?;
    tx.commit().await?;

    info!(booking_id = %updated.id, extra_hours = ?hours_charge, extra_km = ?km_charge,
        "booking completed");
    Ok(updated)
}

/// Customer review: COMPLETED bookings only, at most one per booking-user
/// pair.
pub async fn submit_review(
    pool: &PgPool,
    booking_id: Uuid,
    user_id: Uuid,
    rating: i32,
    review_text: Option<&str>,
) -> Result<Uuid> {
    if !(1..=5).contains(&rating) {
        return Err(AppError::BadRequest("rating must be between 1 and 5".into()));
    }

    let booking = queries::get_booking(pool, booking_id)
        .await?
        .ok_or(AppError::NotFound)?;

    if booking.user_id != user_id {
        return Err(AppError::Forbidden("not your booking".into()));
    }
    if booking.status != BookingStatus::Completed {
        return Err(AppError::UnexpectedBookingState {
            current: booking.status.as_str().into(),
        });
    }
    if queries::review_exists(pool, booking_id, user_id).await? {
        return Err(AppError::BadRequest("booking already reviewed".into()));
    }

    queries::insert_review(pool, booking_id, booking.car_id, user_id, rating, review_text).await
}

fn check_transition(booking: &Booking, next: BookingStatus) -> Result<()> {
    if !booking.status.can_transition_to(next)
        || !statuses_compatible(next, booking.advance_amount_status)
    {
        return Err(AppError::UnexpectedBookingState {
            current: booking.status.as_str().into(),
        });
    }
    Ok(())
}

async fn transition(pool: &PgPool, booking_id: Uuid, next: BookingStatus) -> Result<Booking> {
    let mut tx = pool.begin().await?;
    let booking = queries::get_booking_for_update(&mut *tx, booking_id)
        .await?
        .ok_or(AppError::NotFound)?;

    check_transition(&booking, next)?;

    let updated = queries::update_status(&mut *tx, booking.id, next).await?;
    tx.commit().await?;
    Ok(updated)
}

/// One reaper pass: cancel PENDING bookings whose advance payment has not
/// succeeded within the hold TTL, returning the cars to availability.
/// Reaper cancellations publish the same event as a user cancellation.
pub async fn reap_expired_holds(
    pool: &PgPool,
    notifier: &Notifier,
    ttl: Duration,
) -> Result<u64> {
    let cutoff = Utc::now() - ttl;
    let reaped = queries::expire_stale_pending(pool, cutoff).await?;
    for (booking_id, user_id) in &reaped {
        notifier.publish(BookingEvent::Cancelled {
            booking_id: *booking_id,
            user_id: *user_id,
            refund_amount: None,
        });
    }
    Ok(reaped.len() as u64)
}

/// Background reaper loop for abandoned checkouts.
pub async fn start_hold_reaper(
    pool: PgPool,
    notifier: Notifier,
    ttl: Duration,
    every: StdDuration,
) {
    let mut tick = interval(every);
    loop {
        tick.tick().await;
        match reap_expired_holds(&pool, &notifier, ttl).await {
            Ok(0) => {}
            Ok(n) => info!(expired = n, "reaped abandoned pending bookings"),
            Err(e) => warn!("hold reaper pass failed: {}", e),
        }
    }
}
