//! Risk flag by trade notional.
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// Risk classification of a trade.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskFlag {
    HighRisk,
    MediumRisk,
    LowRisk,
}

/// Notional strictly above the threshold earns the flag.
const RISK_TIERS: [(Decimal, RiskFlag); 2] = [
    (dec!(500000), RiskFlag::HighRisk),
    (dec!(100000), RiskFlag::MediumRisk),
];

/// Flag a trade by its notional. Null notional is low risk.
pub fn risk_flag(notional: Option<Decimal>) -> RiskFlag {
    notional
        .and_then(|n| {
            RISK_TIERS
                .iter()
                .find(|(threshold, _)| n > *threshold)
                .map(|(_, flag)| *flag)
        })
        .unwrap_or(RiskFlag::LowRisk)
}
