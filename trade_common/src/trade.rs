//! Trade record and the closed vocabularies it is built from.
//!
//! The enums mirror the values the generator draws from. Display and parsing use the
//! exact upstream spelling (`Binance`, `BTC/USD`, `SUCCESS`, ...), so a value written by
//! one program compares equal to a string literal in another.

use chrono::NaiveDateTime;
use clap::ValueEnum;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

use crate::attribute::{AttributeValue, Item};
use crate::defaults::KV_KEY_ATTRIBUTE;

/// Timestamp layout used on the wire (ISO-8601, no offset, microseconds).
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

/// Trading venue.
#[allow(missing_docs)]
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, Display, EnumString, Hash, Eq, PartialEq,
)]
#[clap(rename_all = "lower")]
pub enum Exchange {
    Binance,
    Coinbase,
    Kraken,
    FTX,
    OKX,
    Bitfinex,
}

impl Exchange {
    /// Every venue, in declaration order.
    pub const ALL: [Exchange; 6] = [
        Exchange::Binance,
        Exchange::Coinbase,
        Exchange::Kraken,
        Exchange::FTX,
        Exchange::OKX,
        Exchange::Bitfinex,
    ];
}

/// Base/quote pair of a trade.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Display, EnumString, Hash, Eq, PartialEq)]
pub enum TradingPair {
    #[serde(rename = "BTC/USD")]
    #[strum(serialize = "BTC/USD")]
    BtcUsd,
    #[serde(rename = "ETH/USDT")]
    #[strum(serialize = "ETH/USDT")]
    EthUsdt,
    #[serde(rename = "SOL/USD")]
    #[strum(serialize = "SOL/USD")]
    SolUsd,
    #[serde(rename = "ADA/USDT")]
    #[strum(serialize = "ADA/USDT")]
    AdaUsdt,
    #[serde(rename = "XRP/USD")]
    #[strum(serialize = "XRP/USD")]
    XrpUsd,
}

impl TradingPair {
    /// Every pair, in declaration order.
    pub const ALL: [TradingPair; 5] = [
        TradingPair::BtcUsd,
        TradingPair::EthUsdt,
        TradingPair::SolUsd,
        TradingPair::AdaUsdt,
        TradingPair::XrpUsd,
    ];
}

/// Side of the order.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Display, EnumString, Hash, Eq, PartialEq)]
pub enum OrderType {
    BUY,
    SELL,
}

impl OrderType {
    /// Both sides.
    pub const ALL: [OrderType; 2] = [OrderType::BUY, OrderType::SELL];
}

/// Settlement outcome of a trade.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Display, EnumString, Hash, Eq, PartialEq)]
pub enum TradeStatus {
    SUCCESS,
    FAILED,
    PENDING,
}

impl TradeStatus {
    /// Every status.
    pub const ALL: [TradeStatus; 3] = [TradeStatus::SUCCESS, TradeStatus::FAILED, TradeStatus::PENDING];
}

/// Channel the order was placed through.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Display, EnumString, Hash, Eq, PartialEq)]
pub enum OrderSource {
    Web,
    Mobile,
    API,
}

impl OrderSource {
    /// Every source.
    pub const ALL: [OrderSource; 3] = [OrderSource::Web, OrderSource::Mobile, OrderSource::API];
}

/// A single trade as produced by the generator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Trade {
    /// Unique id (uuid v4), record key downstream.
    pub transaction_id: String,
    /// Execution time, UTC without offset.
    pub timestamp: NaiveDateTime,
    /// Trading venue.
    pub exchange: Exchange,
    /// Traded pair.
    pub trading_pair: TradingPair,
    /// Buy or sell.
    pub order_type: OrderType,
    /// Unit price, 2 decimal places.
    pub price: Decimal,
    /// Quantity, 6 decimal places.
    pub quantity: Decimal,
    /// Fee charged, 4 decimal places.
    pub trade_fee: Decimal,
    /// Settlement status.
    pub trade_status: TradeStatus,
    /// Id of the trading user.
    pub user_id: String,
    /// Settlement account of the user.
    pub wallet_address: String,
    /// Channel the order came from.
    pub order_source: OrderSource,
}

impl Trade {
    /// Timestamp rendered in the wire layout.
    pub fn timestamp_string(&self) -> String {
        self.timestamp.format(TIMESTAMP_FORMAT).to_string()
    }

    /// Convert into a key-value store item: strings as `S`, decimals as `N`.
    pub fn to_item(&self) -> Item {
        let mut item = Item::new();
        item.insert(KV_KEY_ATTRIBUTE.to_string(), AttributeValue::S(self.transaction_id.clone()));
        item.insert("timestamp".into(), AttributeValue::S(self.timestamp_string()));
        item.insert("exchange".into(), AttributeValue::S(self.exchange.to_string()));
        item.insert("trading_pair".into(), AttributeValue::S(self.trading_pair.to_string()));
        item.insert("order_type".into(), AttributeValue::S(self.order_type.to_string()));
        item.insert("price".into(), AttributeValue::N(self.price.to_string()));
        item.insert("quantity".into(), AttributeValue::N(self.quantity.to_string()));
        item.insert("trade_fee".into(), AttributeValue::N(self.trade_fee.to_string()));
        item.insert("trade_status".into(), AttributeValue::S(self.trade_status.to_string()));
        item.insert("user_id".into(), AttributeValue::S(self.user_id.clone()));
        item.insert("wallet_address".into(), AttributeValue::S(self.wallet_address.clone()));
        item.insert("order_source".into(), AttributeValue::S(self.order_source.to_string()));
        item
    }
}
