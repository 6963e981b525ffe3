//! Response DTOs for booking API endpoints.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::models::Booking;

use super::calculators::Quote;

/// Booking as returned to API clients.
#[derive(Debug, Serialize)]
pub struct BookingResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub car_id: Uuid,
    pub status: String,
    pub advance_amount_status: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub actual_start_time: Option<DateTime<Utc>>,
    pub actual_end_time: Option<DateTime<Utc>>,
    #[serde(with = "rust_decimal::serde::str")]
    pub advance_amount: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub total_amount: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub deposit_amount: Decimal,
    #[serde(with = "rust_decimal::serde::str_option")]
    pub extra_hours_charge: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::str_option")]
    pub extra_km_charge: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::str_option")]
    pub refund_amount: Option<Decimal>,
    pub refund_status: Option<String>,
    pub cancellation_reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Booking> for BookingResponse {
    fn from(b: Booking) -> Self {
        BookingResponse {
            id: b.id,
            user_id: b.user_id,
            car_id: b.car_id,
            status: b.status.as_str().to_string(),
            advance_amount_status: b.advance_amount_status.as_str().to_string(),
            start_time: b.start_time,
            end_time: b.end_time,
            actual_start_time: b.actual_start_time,
            actual_end_time: b.actual_end_time,
            advance_amount: b.advance_amount,
            total_amount: b.total_amount,
            deposit_amount: b.deposit_amount,
            extra_hours_charge: b.extra_hours_charge,
            extra_km_charge: b.extra_km_charge,
            refund_amount: b.refund_amount,
            refund_status: b.refund_status.map(|s| s.as_str().to_string()),
            cancellation_reason: b.cancellation_reason,
            created_at: b.created_at,
        }
    }
}

/// Response for a price quote
#[derive(Debug, Serialize)]
pub struct QuoteResponse {
    pub days: i64,
    #[serde(with = "rust_decimal::serde::str")]
    pub base_amount: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub discount_applied: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub total_amount: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub advance_amount: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub deposit_amount: Decimal,
}

impl From<Quote> for QuoteResponse {
    fn from(q: Quote) -> Self {
        QuoteResponse {
            days: q.days,
            base_amount: q.base_amount,
            discount_applied: q.discount_applied,
            total_amount: q.total_amount,
            advance_amount: q.advance_amount,
            deposit_amount: q.deposit_amount,
        }
    }
}

/// Response for the availability check
#[derive(Debug, Serialize)]
pub struct AvailabilityResponse {
    pub car_id: Uuid,
    pub available: bool,
}

/// Response after submitting a review
#[derive(Debug, Serialize)]
pub struct ReviewResponse {
    pub id: Uuid,
    pub booking_id: Uuid,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BookingStatus, PaymentStatus};
    use chrono::Utc;
    use rust_decimal_macros::dec;

    #[test]
    fn booking_maps_to_response_with_status_names() {
        let now = Utc::now();
        let booking = Booking {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            car_id: Uuid::new_v4(),
            coupon_id: None,
            start_time: now,
            end_time: now + chrono::Duration::days(2),
            actual_start_time: None,
            actual_end_time: None,
            advance_amount: dec!(3000),
            advance_amount_status: PaymentStatus::Successful,
            total_amount: dec!(3000),
            deposit_amount: dec!(5000),
            extra_hours_charge: None,
            extra_km_charge: None,
            km_travelled: None,
            refund_amount: None,
            refund_status: None,
            status: BookingStatus::Booked,
            cancellation_reason: None,
            cancelled_by: None,
            cancelled_at: None,
            created_at: now,
            updated_at: now,
        };

        let resp = BookingResponse::from(booking.clone());
        assert_eq!(resp.id, booking.id);
        assert_eq!(resp.status, "BOOKED");
        assert_eq!(resp.advance_amount_status, "SUCCESSFUL");
        assert_eq!(resp.total_amount, dec!(3000));

        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["total_amount"], "3000");
        assert_eq!(json["refund_amount"], serde_json::Value::Null);
    }
}
