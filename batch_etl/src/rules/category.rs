//! User category by traded quantity.
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// Trading volume tier of the user behind a trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
pub enum UserCategory {
    /// Quantity above 2.
    #[serde(rename = "VIP Trader")]
    #[strum(serialize = "VIP Trader")]
    Vip,
    /// Quantity above 1.
    #[serde(rename = "Active Trader")]
    #[strum(serialize = "Active Trader")]
    Active,
    /// Everything else.
    #[serde(rename = "Casual Trader")]
    #[strum(serialize = "Casual Trader")]
    Casual,
}

const CATEGORY_TIERS: [(Decimal, UserCategory); 2] = [
    (dec!(2), UserCategory::Vip),
    (dec!(1), UserCategory::Active),
];

/// Categorise by quantity; null quantity is casual.
pub fn user_category(quantity: Option<Decimal>) -> UserCategory {
    quantity
        .and_then(|q| {
            CATEGORY_TIERS
                .iter()
                .find(|(threshold, _)| q > *threshold)
                .map(|(_, category)| *category)
        })
        .unwrap_or(UserCategory::Casual)
}
