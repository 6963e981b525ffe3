//! Payment reconciliation protocol.
//!
//! The gateway is the source of truth for whether money moved; these
//! services reconcile its reports onto the booking under the booking-row
//! lock. Verification is idempotent: replays of an already-settled payment
//! return success without touching anything.

use std::collections::HashMap;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::Value;
use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::{Booking, BookingStatus, PaymentLogEntry, PaymentStatus, PaymentType};
use crate::notify::{BookingEvent, Notifier};

use super::queries;

/// Gateways report amounts with cent precision; anything further off than
/// this is treated as a mismatch.
const AMOUNT_TOLERANCE: Decimal = dec!(0.01);

/// Start an advance payment for a PENDING booking: one new log row and a
/// gateway order id the client completes checkout against.
pub async fn initiate(pool: &PgPool, booking_id: Uuid, user_id: Uuid) -> Result<PaymentLogEntry> {
    let mut tx = pool.begin().await?;

    let booking = crate::booking::queries::get_booking_for_update(&mut *tx, booking_id)
        .await?
        .ok_or(AppError::NotFound)?;

    if booking.user_id != user_id {
        return Err(AppError::Forbidden("not your booking".into()));
    }
    if booking.status != BookingStatus::Pending {
        return Err(AppError::UnexpectedBookingState {
            current: booking.status.as_str().into(),
        });
    }
    if queries::find_successful_advance(&mut *tx, booking_id)
        .await?
        .is_some()
    {
        return Err(AppError::UnexpectedBookingState {
            current: booking.status.as_str().into(),
        });
    }

    let entry = queries::insert_payment_log(
        &mut *tx,
        booking.id,
        booking.user_id,
        booking.advance_amount,
        PaymentType::Advance,
        PaymentStatus::Initiated,
    )
    .await?;

    // Order creation against the real gateway happens out of process; the
    // id recorded here is what the callback will be matched on.
    let order_id = format!("order_{}", Uuid::new_v4().simple());
    let entry = queries::mark_order_created(&mut *tx, entry.id, &order_id).await?;

    crate::booking::queries::settle_advance(
        &mut *tx,
        booking.id,
        PaymentStatus::OrderCreated,
        false,
    )
    .await?;

    tx.commit().await?;

    info!(booking_id = %booking.id, order_id = %order_id, "advance payment initiated");
    Ok(entry)
}

/// A gateway report to reconcile against a booking.
pub struct PaymentReport {
    pub booking_id: Uuid,
    /// The exact log row this report settles, when the caller already
    /// resolved it (callbacks match on the gateway order id). Without it
    /// the latest open attempt is settled.
    pub payment_log_id: Option<Uuid>,
    pub gateway_transaction_id: Option<String>,
    pub amount: Decimal,
    pub success: bool,
    pub failure_reason: Option<String>,
    pub gateway_response: Option<Value>,
}

/// Reconcile a gateway report onto the booking.
///
/// Runs entirely under the booking-row lock so concurrent verifications of
/// the same booking serialize. Outcomes:
///   - already settled (SUCCESSFUL advance log or BOOKED booking): returns
///     the booking unchanged;
///   - reported amount off by more than the tolerance: rejected without
///     writing anything, the attempt stays open (manual review);
///   - gateway failure: logged FAILED, booking stays PENDING for retry;
///   - gateway success: logged SUCCESSFUL, booking promoted to BOOKED.
pub async fn verify(pool: &PgPool, notifier: &Notifier, report: PaymentReport) -> Result<Booking> {
    let mut tx = pool.begin().await?;

    let booking = crate::booking::queries::get_booking_for_update(&mut *tx, report.booking_id)
        .await?
        .ok_or(AppError::NotFound)?;

    // Idempotency short-circuit: a replayed success changes nothing.
    if booking.status == BookingStatus::Booked
        || queries::find_successful_advance(&mut *tx, booking.id)
            .await?
            .is_some()
    {
        info!(booking_id = %booking.id, "payment already settled, replay ignored");
        return Ok(booking);
    }

    if booking.status != BookingStatus::Pending {
        return Err(AppError::UnexpectedBookingState {
            current: booking.status.as_str().into(),
        });
    }

    let expected = booking.expected_payable(PaymentType::Advance);
    if (report.amount - expected).abs() > AMOUNT_TOLERANCE {
        warn!(booking_id = %booking.id, reported = %report.amount, expected = %expected,
            "payment amount mismatch");
        // Rejected with no writes: the transaction drops here, so the open
        // attempt is untouched and the real checkout can still settle it.
        return Err(AppError::AmountMismatch);
    }

    // The row this verification settles. A caller-resolved row must belong
    // to this booking; otherwise fall back to the latest open attempt, and
    // callbacks can arrive for attempts we never saw initiated
    // (client-side checkout), so create one if needed.
    let log = match report.payment_log_id {
        Some(log_id) => {
            let log = queries::get_log(&mut *tx, log_id)
                .await?
                .ok_or(AppError::NotFound)?;
            if log.booking_id != booking.id {
                return Err(AppError::BadRequest(
                    "payment log does not belong to this booking".into(),
                ));
            }
            log
        }
        None => match queries::latest_open_advance(&mut *tx, booking.id).await? {
            Some(log) => log,
            None => {
                queries::insert_payment_log(
                    &mut *tx,
                    booking.id,
                    booking.user_id,
                    report.amount,
                    PaymentType::Advance,
                    PaymentStatus::Initiated,
                )
                .await?
            }
        },
    };

    if !report.success {
        queries::record_outcome(
            &mut *tx,
            log.id,
            PaymentStatus::Failed,
            report.gateway_transaction_id.as_deref(),
            report.gateway_response.as_ref(),
            report.failure_reason.as_deref(),
        )
        .await?;
        let updated = crate::booking::queries::settle_advance(
            &mut *tx,
            booking.id,
            PaymentStatus::Failed,
            false,
        )
        .await?;
        tx.commit().await?;

        info!(booking_id = %updated.id, reason = ?report.failure_reason,
            "advance payment failed, booking stays pending");
        return Ok(updated);
    }

    queries::record_outcome(
        &mut *tx,
        log.id,
        PaymentStatus::Successful,
        report.gateway_transaction_id.as_deref(),
        report.gateway_response.as_ref(),
        None,
    )
    .await?;
    let updated = crate::booking::queries::settle_advance(
        &mut *tx,
        booking.id,
        PaymentStatus::Successful,
        true,
    )
    .await?;
    tx.commit().await?;

    info!(booking_id = %updated.id, amount = %report.amount, "advance payment confirmed");
    notifier.publish(BookingEvent::Confirmed {
        booking_id: updated.id,
        user_id: updated.user_id,
        amount: report.amount,
    });
    Ok(updated)
}

/// Decode a gateway callback (flat key-value form) into a report and run
/// the same reconciliation path as an explicit verify.
pub async fn handle_callback(
    pool: &PgPool,
    notifier: &Notifier,
    fields: HashMap<String, String>,
) -> Result<Booking> {
    let order_id = fields
        .get("order_id")
        .ok_or_else(|| AppError::BadRequest("callback missing order id".into()))?;

    let log = queries::find_by_order_id(pool, order_id)
        .await?
        .ok_or(AppError::NotFound)?;

    let transaction_id = fields
        .get("tracking_id")
        .or_else(|| fields.get("transaction_id"))
        .cloned();

    let amount = match fields.get("amount") {
        Some(raw) => raw
            .parse::<Decimal>()
            .map_err(|_| AppError::BadRequest("callback has malformed amount".into()))?,
        // Callbacks that omit the amount are trusted for the logged one.
        None => log.amount,
    };

    let success = matches!(
        fields.get("order_status").map(String::as_str),
        Some("Success") | Some("Successful")
    );
    let failure_reason = fields
        .get("failure_message")
        .or_else(|| fields.get("status_message"))
        .cloned();

    let raw = serde_json::to_value(&fields)
        .map_err(|e| AppError::Internal(format!("callback serialization: {e}")))?;

    verify(
        pool,
        notifier,
        PaymentReport {
            booking_id: log.booking_id,
            payment_log_id: Some(log.id),
            gateway_transaction_id: transaction_id,
            amount,
            success,
            failure_reason,
            gateway_response: Some(raw),
        },
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amount_tolerance_is_one_cent() {
        let expected = dec!(1500.00);
        assert!((dec!(1500.01) - expected).abs() <= AMOUNT_TOLERANCE);
        assert!((dec!(1499.99) - expected).abs() <= AMOUNT_TOLERANCE);
        assert!((dec!(1500.02) - expected).abs() > AMOUNT_TOLERANCE);
        assert!((dec!(1400.00) - expected).abs() > AMOUNT_TOLERANCE);
    }
}
