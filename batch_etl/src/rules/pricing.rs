//! Exchange price normalisation and fee discounts.
use crate::cast::DecimalType;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::str::FromStr;
use trade_common::trade::Exchange;

/// Column type of the normalised price.
pub const NORMALIZED_PRICE_TYPE: DecimalType = DecimalType::new(10, 2);

/// Price variance adjustment per venue.
const EXCHANGE_PRICE_MULTIPLIERS: [(Exchange, Decimal); 6] = [
    (Exchange::Binance, dec!(1.00)),
    (Exchange::Coinbase, dec!(1.02)),
    (Exchange::Kraken, dec!(0.98)),
    (Exchange::OKX, dec!(1.01)),
    (Exchange::FTX, dec!(0.99)),
    (Exchange::Bitfinex, dec!(1.03)),
];

/// Notional at or above the threshold earns the discount factor.
const FEE_TIERS: [(Decimal, Decimal); 2] = [
    (dec!(100000), dec!(0.9)),
    (dec!(50000), dec!(0.95)),
];

/// Multiplier for an exchange name; `None` for venues without an adjustment.
pub fn price_multiplier(exchange: &str) -> Option<Decimal> {
    let exchange = Exchange::from_str(exchange).ok()?;
    EXCHANGE_PRICE_MULTIPLIERS
        .iter()
        .find(|(venue, _)| *venue == exchange)
        .map(|(_, factor)| *factor)
}

/// Price adjusted for the venue's variance, as `DECIMAL(10,2)`.
///
/// Unknown or missing venues keep the price as is.
pub fn normalized_price(exchange: Option<&str>, price: Option<Decimal>) -> Option<Decimal> {
    let price = price?;
    let adjusted = match exchange.and_then(price_multiplier) {
        Some(factor) => price.checked_mul(factor)?,
        None => price,
    };
    NORMALIZED_PRICE_TYPE.fit(adjusted)
}

/// Fee after the volume discount for the trade's notional.
pub fn adjusted_trade_fee(notional: Option<Decimal>, fee: Option<Decimal>) -> Option<Decimal> {
    let fee = fee?;
    let discount = notional.and_then(|n| {
        FEE_TIERS
            .iter()
            .find(|(threshold, _)| n >= *threshold)
            .map(|(_, factor)| *factor)
    });
    match discount {
        Some(factor) => fee.checked_mul(factor),
        None => Some(fee),
    }
}
