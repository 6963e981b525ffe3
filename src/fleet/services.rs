//! Fleet maintenance operations.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::error::{AppError, ConflictKind, Result};
use crate::models::AvailabilityBlock;

use super::queries;

/// Create a staff availability block for a car.
///
/// Takes the same car-row lock as the reservation guard, so a block and a
/// booking racing for the same window cannot both win. Windows overlapping
/// an active booking are rejected; the booking must be cancelled first.
pub async fn create_block(
    pool: &PgPool,
    car_id: Uuid,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    reason: &str,
    created_by: Uuid,
) -> Result<AvailabilityBlock> {
    if start >= end {
        return Err(AppError::InvalidWindow(
            "start time must be before end time".into(),
        ));
    }

    let mut tx = pool.begin().await?;

    crate::booking::queries::get_active_car_for_update(&mut *tx, car_id)
        .await?
        .ok_or(AppError::NotFound)?;

    if crate::booking::queries::find_overlapping_booking(&mut *tx, car_id, start, end, None)
        .await?
        .is_some()
    {
        return Err(AppError::AvailabilityConflict(ConflictKind::Booking));
    }

    let block = queries::insert_block(&mut *tx, car_id, start, end, reason, created_by).await?;
    tx.commit().await?;

    info!(car_id = %car_id, block_id = %block.id, "availability block created");
    Ok(block)
}

pub async fn remove_block(pool: &PgPool, block_id: Uuid) -> Result<()> {
    if !queries::delete_block(pool, block_id).await? {
        return Err(AppError::NotFound);
    }
    info!(block_id = %block_id, "availability block removed");
    Ok(())
}
