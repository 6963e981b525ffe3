//! Database queries for payment logs.

use rust_decimal::Decimal;
use serde_json::Value;
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use crate::error::Result;
use crate::models::{PaymentLogEntry, PaymentStatus, PaymentType};

/// The only gateway currently wired up.
pub const DEFAULT_GATEWAY: &str = "ccavenue";

const LOG_COLUMNS: &str = r#"
    id, booking_id, user_id, amount, payment_type, payment_status,
    payment_gateway, gateway_transaction_id, gateway_order_id,
    gateway_response, failure_reason, created_at
"#;

/// Insert a bare payment log row (no gateway order yet).
pub async fn insert_payment_log(
    exec: impl PgExecutor<'_>,
    booking_id: Uuid,
    user_id: Uuid,
    amount: Decimal,
    payment_type: PaymentType,
    status: PaymentStatus,
) -> Result<PaymentLogEntry> {
    let sql = format!(
        r#"
        INSERT INTO payment_logs
            (id, booking_id, user_id, amount, payment_type, payment_status,
             payment_gateway, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, now())
        RETURNING {LOG_COLUMNS}
        "#
    );
    let entry = sqlx::query_as::<_, PaymentLogEntry>(&sql)
        .bind(Uuid::new_v4())
        .bind(booking_id)
        .bind(user_id)
        .bind(amount)
        .bind(payment_type)
        .bind(status)
        .bind(DEFAULT_GATEWAY)
        .fetch_one(exec)
        .await?;

    Ok(entry)
}

/// Stamp the gateway order id on a log row and move it to ORDER_CREATED.
pub async fn mark_order_created(
    exec: impl PgExecutor<'_>,
    log_id: Uuid,
    gateway_order_id: &str,
) -> Result<PaymentLogEntry> {
    let sql = format!(
        r#"
        UPDATE payment_logs
        SET payment_status = 'ORDER_CREATED', gateway_order_id = $2
        WHERE id = $1
        RETURNING {LOG_COLUMNS}
        "#
    );
    let entry = sqlx::query_as::<_, PaymentLogEntry>(&sql)
        .bind(log_id)
        .bind(gateway_order_id)
        .fetch_one(exec)
        .await?;

    Ok(entry)
}

/// Record the terminal outcome of one payment attempt.
pub async fn record_outcome(
    exec: impl PgExecutor<'_>,
    log_id: Uuid,
    status: PaymentStatus,
    gateway_transaction_id: Option<&str>,
    gateway_response: Option<&Value>,
    failure_reason: Option<&str>,
) -> Result<PaymentLogEntry> {
    let sql = format!(
        r#"
        UPDATE payment_logs
        SET payment_status = $2,
            gateway_transaction_id = COALESCE($3, gateway_transaction_id),
            gateway_response = COALESCE($4, gateway_response),
            failure_reason = $5
        WHERE id = $1
        RETURNING {LOG_COLUMNS}
        "#
    );
    let entry = sqlx::query_as::<_, PaymentLogEntry>(&sql)
        .bind(log_id)
        .bind(status)
        .bind(gateway_transaction_id)
        .bind(gateway_response)
        .bind(failure_reason)
        .fetch_one(exec)
        .await?;

    Ok(entry)
}

pub async fn get_log(exec: impl PgExecutor<'_>, log_id: Uuid) -> Result<Option<PaymentLogEntry>> {
    let sql = format!("SELECT {LOG_COLUMNS} FROM payment_logs WHERE id = $1");
    let entry = sqlx::query_as::<_, PaymentLogEntry>(&sql)
        .bind(log_id)
        .fetch_optional(exec)
        .await?;

    Ok(entry)
}

/// The SUCCESSFUL advance log for a booking, if any. This is the
/// idempotency anchor for verification.
pub async fn find_successful_advance(
    exec: impl PgExecutor<'_>,
    booking_id: Uuid,
) -> Result<Option<PaymentLogEntry>> {
    let sql = format!(
        r#"
        SELECT {LOG_COLUMNS}
        FROM payment_logs
        WHERE booking_id = $1
          AND payment_type = 'ADVANCE'
          AND payment_status = 'SUCCESSFUL'
        LIMIT 1
        "#
    );
    let entry = sqlx::query_as::<_, PaymentLogEntry>(&sql)
        .bind(booking_id)
        .fetch_optional(exec)
        .await?;

    Ok(entry)
}

/// Latest non-terminal advance attempt for a booking (the row a
/// verification settles).
pub async fn latest_open_advance(
    exec: impl PgExecutor<'_>,
    booking_id: Uuid,
) -> Result<Option<PaymentLogEntry>> {
    let sql = format!(
        r#"
        SELECT {LOG_COLUMNS}
        FROM payment_logs
        WHERE booking_id = $1
          AND payment_type = 'ADVANCE'
          AND payment_status IN ('INITIATED', 'ORDER_CREATED')
        ORDER BY created_at DESC
        LIMIT 1
        "#
    );
    let entry = sqlx::query_as::<_, PaymentLogEntry>(&sql)
        .bind(booking_id)
        .fetch_optional(exec)
        .await?;

    Ok(entry)
}

/// Find a log row by the gateway's order id (callback path).
pub async fn find_by_order_id(
    exec: impl PgExecutor<'_>,
    gateway_order_id: &str,
) -> Result<Option<PaymentLogEntry>> {
    let sql = format!(
        r#"
        SELECT {LOG_COLUMNS}
        FROM payment_logs
        WHERE gateway_order_id = $1
        ORDER BY created_at DESC
        LIMIT 1
        "#
    );
    let entry = sqlx::query_as::<_, PaymentLogEntry>(&sql)
        .bind(gateway_order_id)
        .fetch_optional(exec)
        .await?;

    Ok(entry)
}

/// Full payment history for a booking, oldest first.
pub async fn list_for_booking(pool: &PgPool, booking_id: Uuid) -> Result<Vec<PaymentLogEntry>> {
    let sql = format!(
        "SELECT {LOG_COLUMNS} FROM payment_logs WHERE booking_id = $1 ORDER BY created_at ASC"
    );
    let entries = sqlx::query_as::<_, PaymentLogEntry>(&sql)
        .bind(booking_id)
        .fetch_all(pool)
        .await?;

    Ok(entries)
}
