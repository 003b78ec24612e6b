//! Safe numeric coercion at store-to-core and transport-to-core boundaries.
//!
//! The engine's arithmetic assumes well-formed numbers. Historical records
//! and loosely-typed callers do not always provide them, so every boundary
//! runs incoming amounts through these helpers: missing, non-numeric, or
//! unparseable input coerces to zero rather than failing. A single
//! malformed record must never block computation for the rest of a batch.

use rust_decimal::Decimal;
use serde_json::Value;
use std::str::FromStr;

/// Returns the contained value, or zero when absent.
pub fn or_zero(value: Option<Decimal>) -> Decimal {
    value.unwrap_or(Decimal::ZERO)
}

/// Coerces a loosely-typed JSON value into a `Decimal`.
///
/// Numbers and numeric strings parse; everything else (null, booleans,
/// arrays, objects, garbage strings) coerces to zero.
pub fn coerce(value: &Value) -> Decimal {
    match value {
        Value::Number(n) => Decimal::from_str(&n.to_string()).unwrap_or(Decimal::ZERO),
        Value::String(s) => Decimal::from_str(s.trim()).unwrap_or(Decimal::ZERO),
        _ => Decimal::ZERO,
    }
}
