//! Response DTOs for payment API endpoints.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::models::PaymentLogEntry;

/// One payment attempt as returned to API clients.
#[derive(Debug, Serialize)]
pub struct PaymentLogResponse {
    pub id: Uuid,
    pub booking_id: Uuid,
    #[serde(with = "rust_decimal::serde::str")]
    pub amount: Decimal,
    pub payment_type: String,
    pub payment_status: String,
    pub payment_gateway: String,
    pub gateway_order_id: Option<String>,
    pub gateway_transaction_id: Option<String>,
    pub failure_reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<PaymentLogEntry> for PaymentLogResponse {
    fn from(e: PaymentLogEntry) -> Self {
        PaymentLogResponse {
            id: e.id,
            booking_id: e.booking_id,
            amount: e.amount,
            payment_type: e.payment_type.as_str().to_string(),
            payment_status: e.payment_status.as_str().to_string(),
            payment_gateway: e.payment_gateway,
            gateway_order_id: e.gateway_order_id,
            gateway_transaction_id: e.gateway_transaction_id,
            failure_reason: e.failure_reason,
            created_at: e.created_at,
        }
    }
}
