//! Payment log entities
//!
//! Every payment attempt (advance, balance, deposit, refund, extra charge)
//! gets one audit row. Rows are mutated only by the reconciliation
//! protocol and never deleted.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

use super::PaymentStatus;

/// What the payment is for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "payment_type", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentType {
    Advance,
    Balance,
    Deposit,
    Refund,
    ExtraCharges,
}

impl PaymentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentType::Advance => "ADVANCE",
            PaymentType::Balance => "BALANCE",
            PaymentType::Deposit => "DEPOSIT",
            PaymentType::Refund => "REFUND",
            PaymentType::ExtraCharges => "EXTRA_CHARGES",
        }
    }
}

/// Audit record of one payment attempt tied to a booking.
///
/// Invariant: at most one ADVANCE entry per booking may ever reach
/// SUCCESSFUL — this is the idempotency boundary the reconciliation
/// protocol enforces.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PaymentLogEntry {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub user_id: Uuid,
    #[serde(with = "rust_decimal::serde::str")]
    pub amount: Decimal,
    pub payment_type: PaymentType,
    pub payment_status: PaymentStatus,
    pub payment_gateway: String,
    pub gateway_transaction_id: Option<String>,
    pub gateway_order_id: Option<String>,
    pub gateway_response: Option<Value>,
    pub failure_reason: Option<String>,
    pub created_at: DateTime<Utc>,
}
