//! Monetary amounts as exchanged with the gateway.
//!
//! Amounts are `rust_decimal::Decimal` end to end so that `"0.1" + "0.2"`
//! style float drift never reaches a signature. The gateway expects exactly
//! two decimals in the signed `money` parameter.

use rust_decimal::{Decimal, RoundingStrategy};

/// Decimal places the gateway expects.
pub const AMOUNT_SCALE: u32 = 2;

/// Round half away from zero to two decimals and pin the scale, so that
/// `29` renders as `29.00`.
pub fn normalize_amount(amount: Decimal) -> Decimal {
    let mut rounded =
        amount.round_dp_with_strategy(AMOUNT_SCALE, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(AMOUNT_SCALE);
    rounded
}

/// Parse a decimal string, accepting plain and scientific notation.
pub fn parse_decimal(raw: &str) -> Option<Decimal> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    raw.parse::<Decimal>()
        .ok()
        .or_else(|| Decimal::from_scientific(raw).ok())
}

/// Parse a request `money` field, which clients send either as a JSON number
/// or as a numeric string. Returns the normalized amount.
///
/// Values too large to carry two decimals within `Decimal`'s 28 digits are
/// rejected, since they could not be signed as a two-decimal string.
pub fn parse_request_amount(value: &serde_json::Value) -> Option<Decimal> {
    let parsed = match value {
        serde_json::Value::Number(n) => parse_decimal(&n.to_string()),
        serde_json::Value::String(s) => parse_decimal(s),
        _ => None,
    }?;
    Some(normalize_amount(parsed)).filter(|m| m.scale() == AMOUNT_SCALE)
}

/// Two-decimal string used in the signed parameter set and in storage.
pub fn format_amount(amount: Decimal) -> String {
    normalize_amount(amount).to_string()
}

/// Numeric comparison of a stored amount with one reported by the gateway.
///
/// `0.010` equals `0.01`; an unparsable report never matches.
pub fn amounts_match(stored: Decimal, reported: &str) -> bool {
    parse_decimal(reported).is_some_and(|r| r == stored)
}
