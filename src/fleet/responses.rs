//! Response DTOs for fleet API endpoints.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::models::{AvailabilityBlock, Car};

/// Car listing entry with the derived pricing fields clients quote from.
#[derive(Debug, Serialize)]
pub struct CarResponse {
    pub id: Uuid,
    pub brand: String,
    pub car_model: String,
    pub active: bool,
    #[serde(with = "rust_decimal::serde::str")]
    pub price_per_day: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub deposit: Decimal,
    pub included_km_per_day: i32,
}

impl From<Car> for CarResponse {
    fn from(c: Car) -> Self {
        CarResponse {
            price_per_day: c.price_per_day(),
            deposit: c.deposit(),
            id: c.id,
            brand: c.brand,
            car_model: c.car_model,
            active: c.active,
            included_km_per_day: c.included_km_per_day,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BlockResponse {
    pub id: Uuid,
    pub car_id: Uuid,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub reason: Option<String>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl From<AvailabilityBlock> for BlockResponse {
    fn from(b: AvailabilityBlock) -> Self {
        BlockResponse {
            id: b.id,
            car_id: b.car_id,
            start_date: b.start_date,
            end_date: b.end_date,
            reason: b.reason,
            created_by: b.created_by,
            created_at: b.created_at,
        }
    }
}
