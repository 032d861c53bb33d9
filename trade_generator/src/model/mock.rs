//! Synthetic trade records.
//!
//! Prices, quantities and fees are drawn on their decimal grid directly (cents,
//! micro-units, basis points of a unit) so every value already has the scale the
//! downstream columns expect.

use chrono::{SubsecRound, Utc};
use rand::Rng;
use rust_decimal::Decimal;
use trade_common::trade::{Exchange, OrderSource, OrderType, Trade, TradeStatus, TradingPair};
use uuid::Uuid;

const WALLET_COUNTRIES: [&str; 6] = ["DE", "GB", "FR", "NL", "ES", "IT"];

/// Pick one value uniformly. `values` must not be empty.
fn pick<T: Copy, R: Rng + ?Sized>(rng: &mut R, values: &[T]) -> T {
    values[rng.random_range(0..values.len())]
}

/// Build a fake trade drawn from `exchanges`, stamped with the current UTC time.
///
/// - price: 100.00 ..= 70000.00
/// - quantity: 0.010000 ..= 5.000000
/// - trade_fee: 0.0100 ..= 1.0000
pub fn generate_mock_transaction<R: Rng + ?Sized>(rng: &mut R, exchanges: &[Exchange]) -> Trade {
    Trade {
        transaction_id: Uuid::new_v4().to_string(),
        timestamp: Utc::now().naive_utc().trunc_subsecs(6),
        exchange: pick(rng, exchanges),
        trading_pair: pick(rng, &TradingPair::ALL),
        order_type: pick(rng, &OrderType::ALL),
        price: Decimal::new(rng.random_range(10_000..=7_000_000), 2),
        quantity: Decimal::new(rng.random_range(10_000..=5_000_000), 6),
        trade_fee: Decimal::new(rng.random_range(100..=10_000), 4),
        trade_status: pick(rng, &TradeStatus::ALL),
        user_id: Uuid::new_v4().to_string(),
        wallet_address: mock_iban(rng),
        order_source: pick(rng, &OrderSource::ALL),
    }
}

/// IBAN-shaped account id with valid mod-97 check digits.
pub fn mock_iban<R: Rng + ?Sized>(rng: &mut R) -> String {
    let country = pick(rng, &WALLET_COUNTRIES);
    let bank: String = (0..4)
        .map(|_| char::from(b'A' + rng.random_range(0..26u8)))
        .collect();
    let account: String = (0..14)
        .map(|_| char::from(b'0' + rng.random_range(0..10u8)))
        .collect();
    let bban = format!("{bank}{account}");
    let check = 98 - iban_mod97(&format!("{bban}{country}00"));
    format!("{country}{check:02}{bban}")
}

/// Remainder mod 97 of an alphanumeric string, letters counting as 10..=35.
fn iban_mod97(s: &str) -> u32 {
    s.chars().fold(0u32, |acc, c| match c.to_digit(36) {
        Some(v) if v >= 10 => (acc * 100 + v) % 97,
        Some(v) => (acc * 10 + v) % 97,
        None => acc,
    })
}
