//! Business-rule column derivations.
//!
//! Every rule is a small lookup table evaluated top to bottom; the first matching row
//! wins and a fallback applies when nothing matches (including null inputs, which
//! never match a threshold).
//!
//! - `risk` - risk flag by trade notional.
//! - `pricing` - per-exchange price normalisation and fee discounts.
//! - `category` - user category by traded quantity.
//! - `time` - timestamp parsing and hour bucketing.

pub mod category;
pub mod pricing;
pub mod risk;
pub mod time;

use rust_decimal::Decimal;

/// Trade notional (`quantity * price`); null when either side is null.
pub fn notional(quantity: Option<Decimal>, price: Option<Decimal>) -> Option<Decimal> {
    quantity?.checked_mul(price?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_notional_propagates_null() {
        assert_eq!(notional(Some(dec!(2.5)), Some(dec!(100.00))), Some(dec!(250)));
        assert_eq!(notional(None, Some(dec!(1))), None);
        assert_eq!(notional(Some(dec!(1)), None), None);
    }
}
