//! Money helpers: every amount is a `Decimal` snapped to cents.

use rust_decimal::{Decimal, RoundingStrategy};

/// Currency amount with cent precision.
pub type Money = Decimal;

/// Truncate to whole cents (floor for non-negative amounts).
pub fn floor_cents(amount: Money) -> Money {
    amount.round_dp_with_strategy(2, RoundingStrategy::ToZero)
}

/// Round to the nearest cent, halves away from zero.
pub fn round_cents(amount: Money) -> Money {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Build an amount from whole cents, e.g. `cents(1050)` is 10.50.
pub fn cents(value: i64) -> Money {
    Decimal::new(value, 2)
}
