//! Booking entity and its two-axis state machine
//!
//! A booking carries two independent status fields: `status` tracks the
//! rental lifecycle, `advance_amount_status` tracks the up-front payment.
//! They move independently (a PENDING booking can see its payment FAIL and
//! be retried), but every write must leave the pair in a combination the
//! compatibility table accepts.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Rental lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "booking_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    Pending,
    /// Staff pre-confirmation for offline/pay-at-pickup flows. Blocks
    /// availability and is cancellable like PENDING; online payment
    /// verification does not apply to it.
    Approved,
    Booked,
    Ongoing,
    Completed,
    Cancelled,
}

impl BookingStatus {
    pub const ALL: [BookingStatus; 6] = [
        BookingStatus::Pending,
        BookingStatus::Approved,
        BookingStatus::Booked,
        BookingStatus::Ongoing,
        BookingStatus::Completed,
        BookingStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "PENDING",
            BookingStatus::Approved => "APPROVED",
            BookingStatus::Booked => "BOOKED",
            BookingStatus::Ongoing => "ONGOING",
            BookingStatus::Completed => "COMPLETED",
            BookingStatus::Cancelled => "CANCELLED",
        }
    }

    /// Terminal states have no outgoing transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, BookingStatus::Completed | BookingStatus::Cancelled)
    }

    /// Active states make the car unavailable for overlapping windows.
    pub fn blocks_availability(&self) -> bool {
        matches!(
            self,
            BookingStatus::Pending
                | BookingStatus::Approved
                | BookingStatus::Booked
                | BookingStatus::Ongoing
        )
    }

    /// States from which a cancellation may be requested (the start-time
    /// guard is checked separately).
    pub fn is_cancellable(&self) -> bool {
        matches!(
            self,
            BookingStatus::Pending | BookingStatus::Approved | BookingStatus::Booked
        )
    }

    /// The transition table. Everything not listed here is rejected.
    pub fn can_transition_to(&self, next: BookingStatus) -> bool {
        use BookingStatus::*;
        matches!(
            (self, next),
            (Pending, Approved)
                | (Pending, Booked)
                | (Pending, Cancelled)
                | (Approved, Ongoing)
                | (Approved, Cancelled)
                | (Booked, Ongoing)
                | (Booked, Cancelled)
                | (Ongoing, Completed)
        )
    }
}

/// Payment lifecycle status, shared by the booking's advance/refund fields
/// and by payment log entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "payment_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Initiated,
    OrderCreated,
    Successful,
    Failed,
    Cancelled,
    Refunded,
    RefundInitiated,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Initiated => "INITIATED",
            PaymentStatus::OrderCreated => "ORDER_CREATED",
            PaymentStatus::Successful => "SUCCESSFUL",
            PaymentStatus::Failed => "FAILED",
            PaymentStatus::Cancelled => "CANCELLED",
            PaymentStatus::Refunded => "REFUNDED",
            PaymentStatus::RefundInitiated => "REFUND_INITIATED",
        }
    }
}

/// Compatibility table between the two axes, validated on every
/// state-machine write.
pub fn statuses_compatible(status: BookingStatus, advance: PaymentStatus) -> bool {
    use BookingStatus::*;
    match status {
        // BOOKED means the advance payment went through, nothing else.
        Booked => advance == PaymentStatus::Successful,
        // Pre-payment states: the advance is pending, created, or failed
        // (failed is retryable without re-reserving).
        Pending | Approved => matches!(
            advance,
            PaymentStatus::Initiated | PaymentStatus::OrderCreated | PaymentStatus::Failed
        ),
        // Approved bookings may reach pickup with payment settled at the
        // car, so the advance axis is unconstrained from here on.
        Ongoing | Completed | Cancelled => true,
    }
}

/// One customer's reservation of one car for one time window.
/// Never hard-deleted (financial record).
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Booking {
    pub id: Uuid,
    pub user_id: Uuid,
    pub car_id: Uuid,
    pub coupon_id: Option<Uuid>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub actual_start_time: Option<DateTime<Utc>>,
    pub actual_end_time: Option<DateTime<Utc>>,
    #[serde(with = "rust_decimal::serde::str")]
    pub advance_amount: Decimal,
    pub advance_amount_status: PaymentStatus,
    #[serde(with = "rust_decimal::serde::str")]
    pub total_amount: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub deposit_amount: Decimal,
    #[serde(with = "rust_decimal::serde::str_option")]
    pub extra_hours_charge: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::str_option")]
    pub extra_km_charge: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::str_option")]
    pub km_travelled: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::str_option")]
    pub refund_amount: Option<Decimal>,
    pub refund_status: Option<PaymentStatus>,
    pub status: BookingStatus,
    pub cancellation_reason: Option<String>,
    pub cancelled_by: Option<Uuid>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    /// The amount a verification of the given payment type must match.
    pub fn expected_payable(&self, payment_type: super::PaymentType) -> Decimal {
        match payment_type {
            super::PaymentType::Advance => self.advance_amount,
            _ => self.total_amount,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_states_have_no_outgoing_transitions() {
        for from in BookingStatus::ALL {
            if from.is_terminal() {
                for to in BookingStatus::ALL {
                    assert!(
                        !from.can_transition_to(to),
                        "{} -> {} must be rejected",
                        from.as_str(),
                        to.as_str()
                    );
                }
            }
        }
    }

    #[test]
    fn every_transition_targets_a_defined_state() {
        // Closure: each allowed transition lands in the enumerated state
        // set, and each non-terminal state has at least one way out.
        for from in BookingStatus::ALL {
            let outgoing: Vec<_> = BookingStatus::ALL
                .into_iter()
                .filter(|to| from.can_transition_to(*to))
                .collect();
            if !from.is_terminal() {
                assert!(!outgoing.is_empty(), "{} is stuck", from.as_str());
            }
            for to in outgoing {
                assert!(BookingStatus::ALL.contains(&to));
            }
        }
    }

    #[test]
    fn self_transitions_rejected() {
        for s in BookingStatus::ALL {
            assert!(!s.can_transition_to(s));
        }
    }

    #[test]
    fn completed_and_cancelled_do_not_block_availability() {
        assert!(!BookingStatus::Completed.blocks_availability());
        assert!(!BookingStatus::Cancelled.blocks_availability());
        assert!(BookingStatus::Pending.blocks_availability());
        assert!(BookingStatus::Ongoing.blocks_availability());
    }

    #[test]
    fn booked_requires_successful_advance() {
        assert!(statuses_compatible(
            BookingStatus::Booked,
            PaymentStatus::Successful
        ));
        assert!(!statuses_compatible(
            BookingStatus::Booked,
            PaymentStatus::Initiated
        ));
        assert!(!statuses_compatible(
            BookingStatus::Booked,
            PaymentStatus::Failed
        ));
    }

    #[test]
    fn pending_allows_failed_advance_for_retry() {
        assert!(statuses_compatible(
            BookingStatus::Pending,
            PaymentStatus::Failed
        ));
        assert!(!statuses_compatible(
            BookingStatus::Pending,
            PaymentStatus::Successful
        ));
    }

    #[test]
    fn statuses_serialize_screaming_snake() {
        assert_eq!(
            serde_json::to_string(&BookingStatus::Ongoing).unwrap(),
            "\"ONGOING\""
        );
        let p: PaymentStatus = serde_json::from_str("\"ORDER_CREATED\"").unwrap();
        assert_eq!(p, PaymentStatus::OrderCreated);
        let r: PaymentStatus = serde_json::from_str("\"REFUND_INITIATED\"").unwrap();
        assert_eq!(r, PaymentStatus::RefundInitiated);
    }
}
