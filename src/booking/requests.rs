//! Request DTOs for booking API endpoints.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

/// Request to create a reservation
#[derive(Debug, Deserialize)]
pub struct CreateBookingRequest {
    pub car_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    #[serde(default)]
    pub coupon_id: Option<Uuid>,
    #[serde(default, with = "rust_decimal::serde::str_option")]
    pub discount_amount: Option<Decimal>,
}

/// Request to quote a window without reserving
#[derive(Debug, Deserialize)]
pub struct QuoteRequest {
    pub car_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    #[serde(default, with = "rust_decimal::serde::str_option")]
    pub discount_amount: Option<Decimal>,
}

/// Query parameters for the availability check
#[derive(Debug, Deserialize)]
pub struct AvailabilityQuery {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

/// Request to cancel a booking
#[derive(Debug, Deserialize)]
pub struct CancelBookingRequest {
    pub reason: String,
}

/// Request to close out a rental at return
#[derive(Debug, Deserialize)]
pub struct ReturnBookingRequest {
    #[serde(default, with = "rust_decimal::serde::str_option")]
    pub km_travelled: Option<Decimal>,
}

/// Request to review a completed booking
#[derive(Debug, Deserialize)]
pub struct ReviewRequest {
    pub rating: i32,
    #[serde(default)]
    pub review_text: Option<String>,
}
