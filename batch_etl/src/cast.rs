//! Fixed precision decimal casts.
//!
//! `DecimalType` mirrors a SQL `DECIMAL(precision, scale)` column: values are rounded
//! half away from zero to `scale` places and must fit in `precision - scale` integer
//! digits. Anything that does not parse or does not fit casts to `None` (SQL null)
//! instead of failing the batch.

use rust_decimal::prelude::*;
use std::str::FromStr;
use serde_json::Value;

/// A `DECIMAL(precision, scale)` column type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecimalType {
    /// Total number of significant digits.
    pub precision: u32,
    /// Digits after the decimal point.
    pub scale: u32,
}

impl DecimalType {
    /// New column type. `scale` must not exceed `precision`.
    pub const fn new(precision: u32, scale: u32) -> Self {
        Self { precision, scale }
    }

    /// Round `value` to this type, `None` on overflow.
    pub fn fit(&self, value: Decimal) -> Option<Decimal> {
        let mut rounded = value.round_dp_with_strategy(self.scale, RoundingStrategy::MidpointAwayFromZero);
        let integral = rounded.abs().trunc().normalize();
        let integral_digits = if integral.is_zero() {
            0
        } else {
            integral.to_string().len() as u32
        };
        if integral_digits > self.precision.saturating_sub(self.scale) {
            return None;
        }
        rounded.rescale(self.scale);
        Some(rounded)
    }

    /// Cast a raw JSON value (number or numeric string) to this type.
    pub fn cast(&self, value: &Value) -> Option<Decimal> {
        parse_decimal(value).and_then(|d| self.fit(d))
    }
}

/// Parse a JSON number or numeric string into a decimal.
pub fn parse_decimal(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(Decimal::from(i))
            } else if let Some(u) = n.as_u64() {
                Some(Decimal::from(u))
            } else {
                n.as_f64().and_then(|f| Decimal::from_str(&f.to_string()).ok())
            }
        }
        Value::String(s) => {
            let s = s.trim();
            Decimal::from_str(s)
                .or_else(|_| Decimal::from_scientific(s))
                .ok()
        }
        _ => None,
    }
}
