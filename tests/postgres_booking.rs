//! Database-backed tests for the reservation guard and the payment
//! reconciliation protocol.
//!
//! These need a migrated Postgres database (apply `schema.sql`) reachable
//! through `DATABASE_URL`, so they are ignored by default:
//!
//!     cargo test -- --ignored

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use rust_decimal_macros::dec;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

use gogocar_booking::booking::queries::get_booking;
use gogocar_booking::booking::services::{
    cancel, complete, pickup, reap_expired_holds, reserve, ReserveRequest,
};
use gogocar_booking::error::AppError;
use gogocar_booking::models::{Booking, BookingStatus, PaymentStatus};
use gogocar_booking::notify::{BookingEvent, Notifier};
use gogocar_booking::payments::queries::get_log;
use gogocar_booking::payments::services::{handle_callback, initiate, verify, PaymentReport};

async fn pool() -> PgPool {
    let url = std::env::var("DATABASE_URL")
        .expect("DATABASE_URL must point at a database with schema.sql applied");
    PgPoolOptions::new()
        .max_connections(16)
        .connect(&url)
        .await
        .expect("failed to connect to test database")
}

async fn seed_car(pool: &PgPool) -> Uuid {
    let id = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO cars (id, brand, car_model, active, base_price, damage_price,
                          included_km_per_day, tariffs)
        VALUES ($1, 'Maruti', 'Swift', true, $2, $3, 200, $4)
        "#,
    )
    .bind(id)
    .bind(dec!(1500))
    .bind(dec!(20000))
    .bind(serde_json::json!({"deposit": 3000, "hourly": 100, "extra_km": 8}))
    .execute(pool)
    .await
    .expect("failed to seed car");
    id
}

fn future_window(days_out: i64) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = Utc::now() + Duration::days(days_out);
    (start, start + Duration::days(2))
}

async fn make_booking(pool: &PgPool, car_id: Uuid, user_id: Uuid, days_out: i64) -> Booking {
    let (start, end) = future_window(days_out);
    reserve(
        pool,
        ReserveRequest {
            car_id,
            user_id,
            start,
            end,
            coupon_id: None,
            discount: None,
        },
    )
    .await
    .expect("reserve failed")
}

fn success_report(booking: &Booking) -> PaymentReport {
    PaymentReport {
        booking_id: booking.id,
        payment_log_id: None,
        gateway_transaction_id: Some("trk_0001".into()),
        amount: booking.advance_amount,
        success: true,
        failure_reason: None,
        gateway_response: None,
    }
}

#[tokio::test]
#[ignore = "requires Postgres via DATABASE_URL"]
async fn concurrent_reserves_allow_exactly_one_booking() {
    let pool = pool().await;
    let car_id = seed_car(&pool).await;
    let (start, end) = future_window(30);

    let mut handles = Vec::new();
    for _ in 0..8 {
        let pool = pool.clone();
        handles.push(tokio::spawn(async move {
            reserve(
                &pool,
                ReserveRequest {
                    car_id,
                    user_id: Uuid::new_v4(),
                    start,
                    end,
                    coupon_id: None,
                    discount: None,
                },
            )
            .await
        }));
    }

    let mut won = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => won += 1,
            Err(AppError::AvailabilityConflict(_)) => {}
            Err(e) => panic!("unexpected reserve error: {e}"),
        }
    }
    assert_eq!(won, 1, "exactly one concurrent reserve may win");

    let rows: i64 =
        sqlx::query_scalar("SELECT count(*) FROM bookings WHERE car_id = $1")
            .bind(car_id)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(rows, 1);
}

#[tokio::test]
#[ignore = "requires Postgres via DATABASE_URL"]
async fn double_verify_settles_once() {
    let pool = pool().await;
    let notifier = Notifier::default();
    let car_id = seed_car(&pool).await;
    let user_id = Uuid::new_v4();
    let booking = make_booking(&pool, car_id, user_id, 10).await;
    initiate(&pool, booking.id, user_id).await.unwrap();

    let first = verify(&pool, &notifier, success_report(&booking)).await.unwrap();
    assert_eq!(first.status, BookingStatus::Booked);
    assert_eq!(first.advance_amount_status, PaymentStatus::Successful);

    let second = verify(&pool, &notifier, success_report(&booking)).await.unwrap();
    assert_eq!(second.status, BookingStatus::Booked);
    assert_eq!(second.advance_amount_status, PaymentStatus::Successful);

    let successful: i64 = sqlx::query_scalar(
        r#"
        SELECT count(*) FROM payment_logs
        WHERE booking_id = $1 AND payment_type = 'ADVANCE'
          AND payment_status = 'SUCCESSFUL'
        "#,
    )
    .bind(booking.id)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(successful, 1);
}

#[tokio::test]
#[ignore = "requires Postgres via DATABASE_URL"]
async fn amount_mismatch_leaves_attempt_open() {
    let pool = pool().await;
    let notifier = Notifier::default();
    let car_id = seed_car(&pool).await;
    let user_id = Uuid::new_v4();
    let booking = make_booking(&pool, car_id, user_id, 10).await;
    let attempt = initiate(&pool, booking.id, user_id).await.unwrap();

    let mut report = success_report(&booking);
    report.amount = booking.advance_amount - dec!(100);
    let err = verify(&pool, &notifier, report).await.unwrap_err();
    assert!(matches!(err, AppError::AmountMismatch));

    // Nothing was written: the booking is still payable and the attempt
    // still open for the real checkout to settle.
    let after = get_booking(&pool, booking.id).await.unwrap().unwrap();
    assert_eq!(after.status, BookingStatus::Pending);
    assert_eq!(after.advance_amount_status, PaymentStatus::OrderCreated);

    let log = get_log(&pool, attempt.id).await.unwrap().unwrap();
    assert_eq!(log.payment_status, PaymentStatus::OrderCreated);
    assert_eq!(log.failure_reason, None);
}

#[tokio::test]
#[ignore = "requires Postgres via DATABASE_URL"]
async fn callback_settles_the_attempt_it_was_issued_for() {
    let pool = pool().await;
    let notifier = Notifier::default();
    let car_id = seed_car(&pool).await;
    let user_id = Uuid::new_v4();
    let booking = make_booking(&pool, car_id, user_id, 10).await;

    // Two open attempts: an abandoned checkout and a retry.
    let first = initiate(&pool, booking.id, user_id).await.unwrap();
    let second = initiate(&pool, booking.id, user_id).await.unwrap();

    let mut fields = HashMap::new();
    fields.insert("order_id".to_string(), first.gateway_order_id.clone().unwrap());
    fields.insert("tracking_id".to_string(), "trk_first".to_string());
    fields.insert("order_status".to_string(), "Success".to_string());
    fields.insert("amount".to_string(), booking.advance_amount.to_string());

    let settled = handle_callback(&pool, &notifier, fields).await.unwrap();
    assert_eq!(settled.status, BookingStatus::Booked);

    // The outcome lands on the attempt the order id belongs to, not on the
    // newest open one.
    let first_after = get_log(&pool, first.id).await.unwrap().unwrap();
    assert_eq!(first_after.payment_status, PaymentStatus::Successful);
    assert_eq!(first_after.gateway_transaction_id.as_deref(), Some("trk_first"));

    let second_after = get_log(&pool, second.id).await.unwrap().unwrap();
    assert_eq!(second_after.payment_status, PaymentStatus::OrderCreated);
}

#[tokio::test]
#[ignore = "requires Postgres via DATABASE_URL"]
async fn return_succeeds_after_car_deactivated() {
    let pool = pool().await;
    let notifier = Notifier::default();
    let car_id = seed_car(&pool).await;
    let user_id = Uuid::new_v4();
    let booking = make_booking(&pool, car_id, user_id, 10).await;
    initiate(&pool, booking.id, user_id).await.unwrap();
    verify(&pool, &notifier, success_report(&booking)).await.unwrap();
    pickup(&pool, booking.id).await.unwrap();

    // Car damaged mid-rental and pulled from the fleet.
    sqlx::query("UPDATE cars SET active = false WHERE id = $1")
        .bind(car_id)
        .execute(&pool)
        .await
        .unwrap();

    let done = complete(&pool, booking.id, Some(dec!(150))).await.unwrap();
    assert_eq!(done.status, BookingStatus::Completed);
}

#[tokio::test]
#[ignore = "requires Postgres via DATABASE_URL"]
async fn reaper_cancels_stale_pending_and_notifies() {
    let pool = pool().await;
    let notifier = Notifier::new(64);
    let mut rx = notifier.subscribe();
    let car_id = seed_car(&pool).await;
    let user_id = Uuid::new_v4();
    let booking = make_booking(&pool, car_id, user_id, 10).await;

    sqlx::query("UPDATE bookings SET created_at = now() - interval '2 hours' WHERE id = $1")
        .bind(booking.id)
        .execute(&pool)
        .await
        .unwrap();

    let reaped = reap_expired_holds(&pool, &notifier, Duration::minutes(30))
        .await
        .unwrap();
    assert!(reaped >= 1);

    let after = get_booking(&pool, booking.id).await.unwrap().unwrap();
    assert_eq!(after.status, BookingStatus::Cancelled);

    // The reaper publishes the same cancellation event a user cancel does.
    let mut seen = false;
    while let Ok(event) = rx.try_recv() {
        if let BookingEvent::Cancelled { booking_id, refund_amount, .. } = event {
            if booking_id == booking.id {
                assert_eq!(refund_amount, None);
                seen = true;
            }
        }
    }
    assert!(seen, "expected a cancellation event for the reaped booking");
}

#[tokio::test]
#[ignore = "requires Postgres via DATABASE_URL"]
async fn cancel_after_start_reports_closed_window() {
    let pool = pool().await;
    let notifier = Notifier::default();
    let car_id = seed_car(&pool).await;
    let user_id = Uuid::new_v4();

    let start = Utc::now() - Duration::hours(1);
    let booking = reserve(
        &pool,
        ReserveRequest {
            car_id,
            user_id,
            start,
            end: start + Duration::days(1),
            coupon_id: None,
            discount: None,
        },
    )
    .await
    .unwrap();

    let err = cancel(&pool, &notifier, booking.id, user_id, false, "changed my mind")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::CancellationWindowClosed));
}
