//! Database queries for cars and staff availability blocks.

use chrono::{DateTime, Utc};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use crate::error::Result;
use crate::models::{AvailabilityBlock, Car};

const CAR_COLUMNS: &str = r#"
    id, brand, car_model, active, base_price, damage_price,
    included_km_per_day, tariffs, created_at
"#;

/// All active cars, stable order for listings.
pub async fn list_active_cars(pool: &PgPool) -> Result<Vec<Car>> {
    let sql = format!("SELECT {CAR_COLUMNS} FROM cars WHERE active = true ORDER BY brand, car_model");
    let cars = sqlx::query_as::<_, Car>(&sql).fetch_all(pool).await?;

    Ok(cars)
}

pub async fn get_car(exec: impl PgExecutor<'_>, car_id: Uuid) -> Result<Option<Car>> {
    let sql = format!("SELECT {CAR_COLUMNS} FROM cars WHERE id = $1");
    let car = sqlx::query_as::<_, Car>(&sql)
        .bind(car_id)
        .fetch_optional(exec)
        .await?;

    Ok(car)
}

/// All blocks for a car, soonest first (staff view).
pub async fn list_blocks_for_car(pool: &PgPool, car_id: Uuid) -> Result<Vec<AvailabilityBlock>> {
    let blocks = sqlx::query_as::<_, AvailabilityBlock>(
        r#"
        SELECT id, car_id, start_date, end_date, reason, created_by, created_at
        FROM availability_blocks
        WHERE car_id = $1
        ORDER BY start_date ASC
        "#,
    )
    .bind(car_id)
    .fetch_all(pool)
    .await?;

    Ok(blocks)
}

pub async fn insert_block(
    exec: impl PgExecutor<'_>,
    car_id: Uuid,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    reason: &str,
    created_by: Uuid,
) -> Result<AvailabilityBlock> {
    let block = sqlx::query_as::<_, AvailabilityBlock>(
        r#"
        INSERT INTO availability_blocks (id, car_id, start_date, end_date, reason, created_by, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, now())
        RETURNING id, car_id, start_date, end_date, reason, created_by, created_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(car_id)
    .bind(start)
    .bind(end)
    .bind(reason)
    .bind(created_by)
    .fetch_one(exec)
    .await?;

    Ok(block)
}

/// Delete a block; returns whether a row was actually removed.
pub async fn delete_block(pool: &PgPool, block_id: Uuid) -> Result<bool> {
    let res = sqlx::query("DELETE FROM availability_blocks WHERE id = $1")
        .bind(block_id)
        .execute(pool)
        .await?;

    Ok(res.rows_affected() > 0)
}
