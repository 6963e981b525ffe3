//! Core booking calculations.
//!
//! Pure functions for window overlap, pricing, refunds and return charges —
//! no database access. Everything the reservation guard stores on a booking
//! is computed here so the same inputs always produce the same money.

use chrono::{DateTime, Utc};
use rust_decimal::prelude::*;
use rust_decimal::Decimal;

const SECONDS_PER_DAY: i64 = 86_400;
const SECONDS_PER_HOUR: i64 = 3_600;

/// Round to specified decimal places using banker's rounding.
pub fn round_money(amount: Decimal, places: u32) -> Decimal {
    amount.round_dp_with_strategy(places, RoundingStrategy::MidpointNearestEven)
}

/// Half-open interval intersection: `[a_start, a_end)` overlaps
/// `[b_start, b_end)` iff `a_start < b_end && a_end > b_start`.
///
/// Symmetric by construction — swapping which window is "new" and which is
/// "existing" never changes the verdict.
pub fn windows_overlap(
    a_start: DateTime<Utc>,
    a_end: DateTime<Utc>,
    b_start: DateTime<Utc>,
    b_end: DateTime<Utc>,
) -> bool {
    a_start < b_end && a_end > b_start
}

/// Billable days for a window: `ceil(duration_secs / 86400)`, minimum 1.
pub fn rental_days(start: DateTime<Utc>, end: DateTime<Utc>) -> i64 {
    let secs = (end - start).num_seconds();
    let days = (secs + SECONDS_PER_DAY - 1) / SECONDS_PER_DAY;
    days.max(1)
}

/// Price breakdown stored on the booking at reservation time.
#[derive(Debug, Clone, PartialEq)]
pub struct Quote {
    pub days: i64,
    pub base_amount: Decimal,
    pub discount_applied: Decimal,
    pub total_amount: Decimal,
    pub advance_amount: Decimal,
    pub deposit_amount: Decimal,
}

/// Compute the quote for a window. `discount` is a pre-computed amount from
/// the coupon service, clamped to `[0, base]`; the deposit is recorded but
/// not part of the payable total.
pub fn compute_quote(
    price_per_day: Decimal,
    deposit: Decimal,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    discount: Option<Decimal>,
) -> Quote {
    let days = rental_days(start, end);
    let base_amount = price_per_day * Decimal::from(days);

    let discount_applied = discount
        .unwrap_or(Decimal::ZERO)
        .max(Decimal::ZERO)
        .min(base_amount);
    let total_amount = round_money(base_amount - discount_applied, 2);

    Quote {
        days,
        base_amount,
        discount_applied,
        total_amount,
        // The full total is collected up front to confirm the booking.
        advance_amount: total_amount,
        deposit_amount: deposit,
    }
}

/// Refund for a cancellation happening `now`, given the contractual start.
///
/// Tiers: >= 24h before start -> 100%, >= 12h -> 50%, < 12h -> nothing.
pub fn refund_amount(advance: Decimal, start: DateTime<Utc>, now: DateTime<Utc>) -> Decimal {
    let secs_before_start = (start - now).num_seconds();
    if secs_before_start >= 24 * SECONDS_PER_HOUR {
        advance
    } else if secs_before_start >= 12 * SECONDS_PER_HOUR {
        round_money(advance / Decimal::from(2), 2)
    } else {
        Decimal::ZERO
    }
}

/// Late-return charge: hourly rate times the fractional hours past the
/// contractual end. Zero when returned on time.
pub fn extra_hours_charge(
    hourly_rate: Decimal,
    contract_end: DateTime<Utc>,
    actual_end: DateTime<Utc>,
) -> Decimal {
    if actual_end <= contract_end {
        return Decimal::ZERO;
    }
    let secs_over = (actual_end - contract_end).num_seconds();
    let hours_over = Decimal::from(secs_over) / Decimal::from(SECONDS_PER_HOUR);
    round_money(hourly_rate * hours_over, 2)
}

/// Over-allowance mileage charge: kilometers beyond
/// `included_km_per_day * days` billed at the per-km rate.
pub fn extra_km_charge(
    rate_per_km: Decimal,
    included_km_per_day: i32,
    days: i64,
    km_travelled: Decimal,
) -> Decimal {
    let allowance = Decimal::from(included_km_per_day) * Decimal::from(days);
    let over = km_travelled - allowance;
    if over <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    round_money(rate_per_km * over, 2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDateTime};
    use rust_decimal_macros::dec;

    fn at(s: &str) -> DateTime<Utc> {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
            .unwrap()
            .and_utc()
    }

    // ==================== windows_overlap tests ====================

    #[test]
    fn overlapping_windows_detected() {
        let a = (at("2024-06-01T10:00:00"), at("2024-06-03T10:00:00"));
        let b = (at("2024-06-02T09:00:00"), at("2024-06-04T09:00:00"));
        assert!(windows_overlap(a.0, a.1, b.0, b.1));
    }

    #[test]
    fn overlap_is_symmetric() {
        let pairs = [
            ("2024-06-01T10:00:00", "2024-06-03T10:00:00", "2024-06-02T09:00:00", "2024-06-04T09:00:00"),
            ("2024-06-01T00:00:00", "2024-06-10T00:00:00", "2024-06-02T00:00:00", "2024-06-03T00:00:00"),
            ("2024-06-01T00:00:00", "2024-06-02T00:00:00", "2024-06-02T00:00:00", "2024-06-03T00:00:00"),
            ("2024-06-01T00:00:00", "2024-06-02T00:00:00", "2024-06-05T00:00:00", "2024-06-06T00:00:00"),
            ("2024-06-01T00:00:00", "2024-06-02T00:00:00", "2024-06-01T00:00:00", "2024-06-02T00:00:00"),
        ];
        for (a0, a1, b0, b1) in pairs {
            let forward = windows_overlap(at(a0), at(a1), at(b0), at(b1));
            let backward = windows_overlap(at(b0), at(b1), at(a0), at(a1));
            assert_eq!(forward, backward, "asymmetry for {a0}..{a1} vs {b0}..{b1}");
        }
    }

    #[test]
    fn touching_endpoints_do_not_overlap() {
        // Half-open: back-to-back rentals sharing an instant are fine.
        assert!(!windows_overlap(
            at("2024-06-01T00:00:00"),
            at("2024-06-02T00:00:00"),
            at("2024-06-02T00:00:00"),
            at("2024-06-03T00:00:00"),
        ));
    }

    #[test]
    fn containment_overlaps() {
        assert!(windows_overlap(
            at("2024-06-01T00:00:00"),
            at("2024-06-10T00:00:00"),
            at("2024-06-03T00:00:00"),
            at("2024-06-04T00:00:00"),
        ));
    }

    // ==================== rental_days tests ====================

    #[test]
    fn exact_24_hours_is_one_day() {
        assert_eq!(
            rental_days(at("2024-06-01T10:00:00"), at("2024-06-02T10:00:00")),
            1
        );
    }

    #[test]
    fn twenty_five_hours_is_two_days() {
        assert_eq!(
            rental_days(at("2024-06-01T10:00:00"), at("2024-06-02T11:00:00")),
            2
        );
    }

    #[test]
    fn thirty_minutes_is_one_day() {
        assert_eq!(
            rental_days(at("2024-06-01T10:00:00"), at("2024-06-01T10:30:00")),
            1
        );
    }

    #[test]
    fn one_second_over_two_days_is_three() {
        assert_eq!(
            rental_days(at("2024-06-01T00:00:00"), at("2024-06-03T00:00:01")),
            3
        );
    }

    // ==================== compute_quote tests ====================

    #[test]
    fn quote_for_exactly_one_day() {
        let q = compute_quote(
            dec!(1500),
            dec!(0),
            at("2024-06-01T10:00:00"),
            at("2024-06-02T10:00:00"),
            None,
        );
        assert_eq!(q.days, 1);
        assert_eq!(q.total_amount, dec!(1500));
        assert_eq!(q.advance_amount, dec!(1500));
    }

    #[test]
    fn quote_is_deterministic() {
        let args = (
            dec!(1337.25),
            dec!(2000),
            at("2024-06-01T10:00:00"),
            at("2024-06-04T11:30:00"),
            Some(dec!(100)),
        );
        let a = compute_quote(args.0, args.1, args.2, args.3, args.4);
        let b = compute_quote(args.0, args.1, args.2, args.3, args.4);
        assert_eq!(a, b);
    }

    #[test]
    fn discount_clamped_to_base() {
        let q = compute_quote(
            dec!(1000),
            dec!(0),
            at("2024-06-01T00:00:00"),
            at("2024-06-02T00:00:00"),
            Some(dec!(5000)),
        );
        assert_eq!(q.discount_applied, dec!(1000));
        assert_eq!(q.total_amount, dec!(0));
    }

    #[test]
    fn negative_discount_ignored() {
        let q = compute_quote(
            dec!(1000),
            dec!(0),
            at("2024-06-01T00:00:00"),
            at("2024-06-02T00:00:00"),
            Some(dec!(-50)),
        );
        assert_eq!(q.discount_applied, dec!(0));
        assert_eq!(q.total_amount, dec!(1000));
    }

    #[test]
    fn deposit_recorded_but_not_payable() {
        let q = compute_quote(
            dec!(1500),
            dec!(3000),
            at("2024-06-01T00:00:00"),
            at("2024-06-02T00:00:00"),
            None,
        );
        assert_eq!(q.deposit_amount, dec!(3000));
        assert_eq!(q.total_amount, dec!(1500));
    }

    // ==================== refund_amount tests ====================

    #[test]
    fn refund_boundaries() {
        let start = at("2024-06-10T12:00:00");
        let advance = dec!(1500);

        // exactly 24h before start: full refund
        assert_eq!(
            refund_amount(advance, start, start - Duration::hours(24)),
            dec!(1500)
        );
        // 23h59m59s: half
        assert_eq!(
            refund_amount(advance, start, start - Duration::hours(24) + Duration::seconds(1)),
            dec!(750)
        );
        // exactly 12h: half
        assert_eq!(
            refund_amount(advance, start, start - Duration::hours(12)),
            dec!(750)
        );
        // 11h59m59s: nothing
        assert_eq!(
            refund_amount(advance, start, start - Duration::hours(12) + Duration::seconds(1)),
            dec!(0)
        );
    }

    #[test]
    fn half_refund_rounds_to_cents() {
        let start = at("2024-06-10T12:00:00");
        let now = start - Duration::hours(13);
        assert_eq!(refund_amount(dec!(1001.01), start, now), dec!(500.50));
    }

    #[test]
    fn thirty_hours_before_start_full_refund() {
        let start = at("2024-06-10T12:00:00");
        assert_eq!(
            refund_amount(dec!(1500), start, start - Duration::hours(30)),
            dec!(1500)
        );
    }

    // ==================== return charge tests ====================

    #[test]
    fn on_time_return_no_extra_hours() {
        let end = at("2024-06-02T10:00:00");
        assert_eq!(extra_hours_charge(dec!(100), end, end), dec!(0));
        assert_eq!(
            extra_hours_charge(dec!(100), end, end - Duration::hours(2)),
            dec!(0)
        );
    }

    #[test]
    fn late_return_billed_fractionally() {
        let end = at("2024-06-02T10:00:00");
        // 90 minutes late at 100/hour
        assert_eq!(
            extra_hours_charge(dec!(100), end, end + Duration::minutes(90)),
            dec!(150)
        );
    }

    #[test]
    fn km_within_allowance_free() {
        assert_eq!(extra_km_charge(dec!(8), 200, 2, dec!(400)), dec!(0));
        assert_eq!(extra_km_charge(dec!(8), 200, 2, dec!(123)), dec!(0));
    }

    #[test]
    fn km_over_allowance_billed() {
        // 2 days * 200 km included, drove 450 -> 50 km over at 8/km
        assert_eq!(extra_km_charge(dec!(8), 200, 2, dec!(450)), dec!(400));
    }
}
