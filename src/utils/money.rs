//! Redondeo de importes

use rust_decimal::{Decimal, RoundingStrategy};

/// Redondear a centavos (0.005 sube)
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}
