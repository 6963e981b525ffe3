//! Request DTOs for payment API endpoints.

use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

/// Request to start an advance payment
#[derive(Debug, Deserialize)]
pub struct InitiatePaymentRequest {
    pub booking_id: Uuid,
}

/// Client-side verification of a completed gateway checkout
#[derive(Debug, Deserialize)]
pub struct VerifyPaymentRequest {
    pub booking_id: Uuid,
    #[serde(default)]
    pub gateway_order_id: Option<String>,
    #[serde(default)]
    pub gateway_transaction_id: Option<String>,
    #[serde(with = "rust_decimal::serde::str")]
    pub amount: Decimal,
    pub success: bool,
    #[serde(default)]
    pub failure_reason: Option<String>,
}
