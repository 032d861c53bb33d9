//! Raw trade rows to enriched trade rows.
//!
//! Applies, in order: the decimal casts, the ingestion time, the rule columns (risk
//! flag, normalised price, adjusted fee, user category, hour bucket) and finally the
//! validity filter. Source columns the job does not touch are carried through as is.

use crate::cast::DecimalType;
use crate::rules::category::{UserCategory, user_category};
use crate::rules::pricing::{adjusted_trade_fee, normalized_price};
use crate::rules::risk::{RiskFlag, risk_flag};
use crate::rules::{notional, time};
use chrono::{DateTime, Utc};
use log::debug;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use trade_common::trade::TradeStatus;

/// Column type of `quantity`.
pub const QUANTITY_TYPE: DecimalType = DecimalType::new(10, 6);
/// Column type of `price`.
pub const PRICE_TYPE: DecimalType = DecimalType::new(10, 2);
/// Column type of `trade_fee`.
pub const TRADE_FEE_TYPE: DecimalType = DecimalType::new(10, 4);

/// Columns the job writes; same-named source columns are replaced.
const DERIVED_COLUMNS: [&str; 9] = [
    "quantity",
    "price",
    "trade_fee",
    "ingestion_time",
    "risk_flag",
    "normalized_price",
    "adjusted_trade_fee",
    "user_category",
    "hour_bucket",
];

/// A raw source row.
pub type RawRow = Map<String, Value>;

/// An enriched trade row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessedTrade {
    /// Quantity as `DECIMAL(10,6)`.
    pub quantity: Decimal,
    /// Price as `DECIMAL(10,2)`.
    pub price: Decimal,
    /// Fee as `DECIMAL(10,4)`; null when the source fee is unusable.
    pub trade_fee: Option<Decimal>,
    /// When this batch ran.
    pub ingestion_time: DateTime<Utc>,
    /// Risk classification by notional.
    pub risk_flag: RiskFlag,
    /// Venue-adjusted price as `DECIMAL(10,2)`.
    pub normalized_price: Option<Decimal>,
    /// Fee after the volume discount.
    pub adjusted_trade_fee: Option<Decimal>,
    /// Volume tier of the user.
    pub user_category: UserCategory,
    /// Hour the trade happened in, `yyyy-MM-dd HH:00:00`.
    pub hour_bucket: Option<String>,
    /// Untouched source columns (`transaction_id`, `exchange`, `timestamp`, ...).
    #[serde(flatten)]
    pub columns: Map<String, Value>,
}

/// Result of transforming one batch.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    /// Rows that passed the filter.
    pub rows: Vec<ProcessedTrade>,
    /// Rows removed by the filter.
    pub filtered: usize,
}

/// Whether a status column value passes the filter. Null never does.
fn status_passes(status: Option<&Value>) -> bool {
    let failed = TradeStatus::FAILED.to_string();
    match status {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => *s != failed,
        Some(other) => other.to_string() != failed,
    }
}

/// Enrich one row. `None` when the row does not pass the filter.
pub fn transform_row(mut raw: RawRow, ingestion_time: DateTime<Utc>) -> Option<ProcessedTrade> {
    let quantity = raw.get("quantity").and_then(|v| QUANTITY_TYPE.cast(v));
    let price = raw.get("price").and_then(|v| PRICE_TYPE.cast(v));
    let trade_fee = raw.get("trade_fee").and_then(|v| TRADE_FEE_TYPE.cast(v));

    let notional = notional(quantity, price);
    let exchange = raw.get("exchange").and_then(Value::as_str);
    let normalized_price = normalized_price(exchange, price);
    let hour_bucket = time::hour_bucket(raw.get("timestamp"));

    let (quantity, price) = match (quantity, price) {
        (Some(q), Some(p)) if q > Decimal::ZERO && p > Decimal::ZERO => (q, p),
        _ => return None,
    };
    if !status_passes(raw.get("trade_status")) {
        return None;
    }

    for column in DERIVED_COLUMNS {
        raw.remove(column);
    }
    Some(ProcessedTrade {
        quantity,
        price,
        trade_fee,
        ingestion_time,
        risk_flag: risk_flag(notional),
        normalized_price,
        adjusted_trade_fee: adjusted_trade_fee(notional, trade_fee),
        user_category: user_category(Some(quantity)),
        hour_bucket,
        columns: raw,
    })
}

/// Enrich a batch, stamping every row with the same `ingestion_time`.
pub fn transform_batch<I>(rows: I, ingestion_time: DateTime<Utc>) -> BatchOutcome
where
    I: IntoIterator<Item = RawRow>,
{
    let mut outcome = BatchOutcome::default();
    for raw in rows {
        match transform_row(raw, ingestion_time) {
            Some(row) => outcome.rows.push(row),
            None => outcome.filtered += 1,
        }
    }
    debug!(
        "Transformed batch: {} kept, {} filtered",
        outcome.rows.len(),
        outcome.filtered
    );
    outcome
}
