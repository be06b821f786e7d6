use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;

pub const MONTHS_PER_YEAR: Decimal = dec!(12);

/// Round a final monetary output to the cent, half-up.
///
/// Only ever applied to values leaving a calculator; intermediate
/// values stay at full precision.
pub fn round_cents(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Truncate to the cent. Used for monthly caps, so twelve of them never
/// exceed the annual figure they came from.
pub fn floor_cents(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::ToZero)
}

pub fn format_cad(amount: Decimal) -> String {
    if amount < Decimal::ZERO {
        format!("-${:.2}", amount.abs())
    } else {
        format!("${:.2}", amount)
    }
}

pub fn format_rate(rate: Decimal) -> String {
    let pct = (rate * dec!(100)).normalize();
    format!("{}%", pct)
}
