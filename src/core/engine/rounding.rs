//! The single rounding rule every money path in the engine goes through.
//!
//! Amounts are kept at two decimal places (the smallest currency unit). Splits
//! round each share with banker's rounding and hand the residual to the last
//! member, so shares always add back up to the original amount exactly.

use rust_decimal::{Decimal, RoundingStrategy};

/// Decimal places of the smallest currency unit.
pub const MINOR_UNIT_DP: u32 = 2;

/// One unit of the smallest currency denomination (0.01).
pub const MINOR_UNIT: Decimal = Decimal::from_parts(1, 0, 0, false, MINOR_UNIT_DP);

pub fn round_minor(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(MINOR_UNIT_DP, RoundingStrategy::MidpointNearestEven)
}

/// True when `amount` carries precision below the smallest currency unit.
pub fn has_sub_minor_precision(amount: Decimal) -> bool {
    round_minor(amount) != amount
}

/// True when `amount` rounds to zero at the minor unit.
pub fn is_negligible(amount: Decimal) -> bool {
    round_minor(amount).is_zero()
}

/// Splits `amount` proportionally to `weights`.
///
/// Every share but the last is `amount * w / Σw` rounded to the minor unit;
/// the last share absorbs whatever is left. Returns an empty vector for empty
/// or non-positive total weight.
pub fn split_weighted(amount: Decimal, weights: &[Decimal]) -> Vec<Decimal> {
    let total_weight: Decimal = weights.iter().copied().sum();
    if weights.is_empty() || total_weight <= Decimal::ZERO {
        return Vec::new();
    }

    let mut shares = Vec::with_capacity(weights.len());
    let mut allocated = Decimal::ZERO;
    for weight in &weights[..weights.len() - 1] {
        let share = round_minor(amount * *weight / total_weight);
        allocated += share;
        shares.push(share);
    }
    shares.push(amount - allocated);
    shares
}

/// Equal split among `count` members.
pub fn split_equally(amount: Decimal, count: usize) -> Vec<Decimal> {
    split_weighted(amount, &vec![Decimal::ONE; count])
}
