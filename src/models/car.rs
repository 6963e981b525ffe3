//! Car and availability-block entities
//!
//! Cars carry a JSONB `tariffs` column ({daily, hourly, deposit, extra_km})
//! maintained by staff tooling. Values arrive as either JSON numbers or
//! strings, so parsing is lenient.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

/// A rentable vehicle
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Car {
    pub id: Uuid,
    pub brand: String,
    pub car_model: String,
    pub active: bool,
    #[serde(with = "rust_decimal::serde::str")]
    pub base_price: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub damage_price: Decimal,
    /// Kilometers included per rental day; driving beyond this is billed
    /// at the `extra_km` tariff on return.
    pub included_km_per_day: i32,
    pub tariffs: Option<Value>,
    pub created_at: DateTime<Utc>,
}

impl Car {
    /// Daily rate: the explicit `daily` tariff when present, else `base_price`.
    pub fn price_per_day(&self) -> Decimal {
        self.tariff("daily").unwrap_or(self.base_price)
    }

    /// Hourly rate for late-return charges; derived from the daily rate when
    /// no explicit `hourly` tariff exists.
    pub fn hourly_rate(&self) -> Decimal {
        self.tariff("hourly")
            .unwrap_or_else(|| self.price_per_day() / Decimal::from(24))
    }

    /// Security deposit, zero when unconfigured.
    pub fn deposit(&self) -> Decimal {
        self.tariff("deposit").unwrap_or(Decimal::ZERO)
    }

    /// Per-kilometer rate for driving beyond the included allowance.
    pub fn extra_km_rate(&self) -> Decimal {
        self.tariff("extra_km").unwrap_or(Decimal::ZERO)
    }

    fn tariff(&self, key: &str) -> Option<Decimal> {
        match self.tariffs.as_ref()?.get(key)? {
            Value::String(s) => s.parse().ok(),
            Value::Number(n) => n.as_f64().and_then(|f| Decimal::try_from(f).ok()),
            _ => None,
        }
    }
}

/// An explicit staff-created unavailability window (maintenance, damage
/// repair, manual hold). Independent of bookings.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AvailabilityBlock {
    pub id: Uuid,
    pub car_id: Uuid,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub reason: Option<String>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn car(tariffs: Option<Value>) -> Car {
        Car {
            id: Uuid::new_v4(),
            brand: "Maruti".into(),
            car_model: "Swift".into(),
            active: true,
            base_price: dec!(1200),
            damage_price: dec!(20000),
            included_km_per_day: 200,
            tariffs,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn daily_tariff_preferred_over_base_price() {
        let c = car(Some(json!({"daily": 1500})));
        assert_eq!(c.price_per_day(), dec!(1500));
    }

    #[test]
    fn base_price_fallback_when_no_tariffs() {
        assert_eq!(car(None).price_per_day(), dec!(1200));
    }

    #[test]
    fn string_tariff_values_parse() {
        let c = car(Some(json!({"daily": "1750.50", "deposit": "3000"})));
        assert_eq!(c.price_per_day(), dec!(1750.50));
        assert_eq!(c.deposit(), dec!(3000));
    }

    #[test]
    fn hourly_derives_from_daily_when_absent() {
        let c = car(Some(json!({"daily": 2400})));
        assert_eq!(c.hourly_rate(), dec!(100));
    }

    #[test]
    fn explicit_hourly_wins() {
        let c = car(Some(json!({"daily": 2400, "hourly": 150})));
        assert_eq!(c.hourly_rate(), dec!(150));
    }

    #[test]
    fn unparseable_tariff_falls_back() {
        let c = car(Some(json!({"daily": [1, 2]})));
        assert_eq!(c.price_per_day(), dec!(1200));
        assert_eq!(c.deposit(), Decimal::ZERO);
    }
}
