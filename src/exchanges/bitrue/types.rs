use crate::core::types::{Balance, Candle, DepthUpdate, KlineUpdate, PriceLevel};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Deserializer, Serialize};

const MAX_DECIMAL_SCALE: u32 = 28;

/// Accepts an integer id sent either as a JSON number or as a string
fn deserialize_id<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Number(u64),
        Text(String),
    }

    match RawId::deserialize(deserializer)? {
        RawId::Number(id) => Ok(id),
        RawId::Text(text) => text.trim().parse().map_err(serde::de::Error::custom),
    }
}

// REST: market data

#[derive(Debug, Clone, Deserialize)]
pub struct ExchangeInfo {
    #[serde(default)]
    pub symbols: Vec<SymbolInfo>,
}

impl ExchangeInfo {
    /// Case-insensitive lookup by symbol name
    pub fn symbol(&self, symbol: &str) -> Option<&SymbolInfo> {
        self.symbols
            .iter()
            .find(|info| info.symbol.eq_ignore_ascii_case(symbol))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SymbolInfo {
    pub symbol: String,
    #[serde(default)]
    pub status: String,
    #[serde(rename = "baseAsset", default)]
    pub base_asset: String,
    #[serde(rename = "quoteAsset", default)]
    pub quote_asset: String,
    #[serde(rename = "baseAssetPrecision")]
    pub base_precision: u32,
    #[serde(rename = "quotePrecision")]
    pub quote_precision: u32,
}

impl SymbolInfo {
    /// Round a price to the symbol's quote precision, halves away from zero
    pub fn trunc_price(&self, price: Decimal) -> Decimal {
        price.round_dp_with_strategy(self.quote_precision, RoundingStrategy::MidpointAwayFromZero)
    }

    /// Round a quantity to the symbol's base precision, halves away from zero
    pub fn trunc_amount(&self, amount: Decimal) -> Decimal {
        amount.round_dp_with_strategy(self.base_precision, RoundingStrategy::MidpointAwayFromZero)
    }

    /// Smallest price increment, `10^-quote_precision`
    pub fn tick_size(&self) -> Decimal {
        Decimal::new(1, self.quote_precision.min(MAX_DECIMAL_SCALE))
    }
}

/// REST order book snapshot; levels are `[price, quantity]`
#[derive(Debug, Clone, Deserialize)]
pub struct RestDepth {
    #[serde(rename = "lastUpdateId", default)]
    pub last_update_id: i64,
    #[serde(default)]
    pub bids: Vec<[Decimal; 2]>,
    #[serde(default)]
    pub asks: Vec<[Decimal; 2]>,
}

impl RestDepth {
    pub fn bid_levels(&self) -> impl Iterator<Item = PriceLevel> + '_ {
        self.bids.iter().copied().map(PriceLevel::from)
    }

    pub fn ask_levels(&self) -> impl Iterator<Item = PriceLevel> + '_ {
        self.asks.iter().copied().map(PriceLevel::from)
    }

    /// Best ask minus best bid
    pub fn spread(&self) -> Option<Decimal> {
        Some(self.asks.first()?[0] - self.bids.first()?[0])
    }

    /// Cumulative bid quantity over the top `rows + 1` levels
    pub fn bid_quantity_through(&self, rows: usize) -> Decimal {
        self.bids.iter().take(rows + 1).map(|level| level[1]).sum()
    }

    /// Cumulative ask quantity over the top `rows + 1` levels
    pub fn ask_quantity_through(&self, rows: usize) -> Decimal {
        self.asks.iter().take(rows + 1).map(|level| level[1]).sum()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PriceTicker {
    pub symbol: String,
    pub price: Decimal,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BookTicker {
    pub symbol: String,
    #[serde(rename = "bidPrice")]
    pub bid_price: Decimal,
    #[serde(rename = "bidQty")]
    pub bid_qty: Decimal,
    #[serde(rename = "askPrice")]
    pub ask_price: Decimal,
    #[serde(rename = "askQty")]
    pub ask_qty: Decimal,
}

// REST: trading and account

/// Acknowledgement returned by `POST /api/v1/order`
#[derive(Debug, Clone, Deserialize)]
pub struct OrderAck {
    #[serde(default)]
    pub symbol: String,
    #[serde(rename = "orderId", deserialize_with = "deserialize_id")]
    pub order_id: u64,
    #[serde(rename = "clientOrderId", default)]
    pub client_order_id: Option<String>,
    #[serde(rename = "transactTime", default)]
    pub transact_time: Option<i64>,
}

/// Acknowledgement returned by `DELETE /api/v1/order`
#[derive(Debug, Clone, Deserialize)]
pub struct CancelAck {
    #[serde(default)]
    pub symbol: String,
    #[serde(rename = "orderId", deserialize_with = "deserialize_id")]
    pub order_id: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct OrderData {
    pub symbol: String,
    #[serde(rename = "orderId", deserialize_with = "deserialize_id")]
    pub order_id: u64,
    pub price: Decimal,
    #[serde(rename = "origQty")]
    pub orig_qty: Decimal,
    #[serde(rename = "executedQty", default)]
    pub executed_qty: Decimal,
    #[serde(default)]
    pub side: String,
    #[serde(rename = "type", default)]
    pub order_type: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub time: i64,
    #[serde(rename = "updateTime", default)]
    pub update_time: i64,
}

impl OrderData {
    pub fn is_filled(&self) -> bool {
        self.status == "FILLED"
    }

    pub fn filled_quantity(&self) -> Decimal {
        self.executed_qty
    }

    pub fn unfilled_quantity(&self) -> Decimal {
        self.orig_qty - self.executed_qty
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AccountData {
    #[serde(rename = "updateTime", default)]
    pub update_time: i64,
    #[serde(default)]
    pub balances: Vec<BalanceData>,
}

impl AccountData {
    pub fn balance(&self, asset: &str) -> Option<&BalanceData> {
        self.balances
            .iter()
            .find(|balance| balance.asset.eq_ignore_ascii_case(asset))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BalanceData {
    pub asset: String,
    pub free: Decimal,
    pub locked: Decimal,
}

impl From<BalanceData> for Balance {
    fn from(balance: BalanceData) -> Self {
        Self {
            asset: balance.asset,
            free: balance.free,
            locked: balance.locked,
        }
    }
}

// Stream payloads

/// Response to a subscribe request
#[derive(Debug, Clone, Deserialize)]
pub struct SubscribeAck {
    #[serde(default)]
    pub event_rep: Option<String>,
    #[serde(default)]
    pub channel: Option<String>,
    #[serde(default)]
    pub cb_id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

impl SubscribeAck {
    pub fn is_ok(&self) -> bool {
        self.status.as_deref() == Some("ok")
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DepthTick {
    #[serde(default)]
    pub buys: Vec<[Decimal; 2]>,
    #[serde(default)]
    pub asks: Vec<[Decimal; 2]>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DepthMessage {
    #[serde(default)]
    pub channel: String,
    #[serde(default)]
    pub ts: i64,
    pub tick: Option<DepthTick>,
}

impl DepthMessage {
    /// `None` for frames that carry no book data
    pub fn into_update(self) -> Option<DepthUpdate> {
        let tick = self.tick?;
        Some(DepthUpdate {
            channel: self.channel,
            timestamp: self.ts,
            bids: tick.buys.into_iter().map(PriceLevel::from).collect(),
            asks: tick.asks.into_iter().map(PriceLevel::from).collect(),
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct KlineTick {
    pub id: i64,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub vol: Decimal,
    pub amount: Decimal,
}

#[derive(Debug, Clone, Deserialize)]
pub struct KlineMessage {
    #[serde(default)]
    pub channel: String,
    #[serde(default)]
    pub ts: i64,
    pub tick: Option<KlineTick>,
}

impl KlineMessage {
    pub fn into_update(self) -> Option<KlineUpdate> {
        let tick = self.tick?;
        Some(KlineUpdate {
            channel: self.channel,
            timestamp: self.ts,
            candle: Candle {
                id: tick.id,
                open: tick.open,
                high: tick.high,
                low: tick.low,
                close: tick.close,
                volume: tick.vol,
                amount: tick.amount,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(value: &str) -> Decimal {
        Decimal::from_str(value).unwrap()
    }

    fn btrusdt() -> SymbolInfo {
        SymbolInfo {
            symbol: "BTRUSDT".to_string(),
            status: "TRADING".to_string(),
            base_asset: "BTR".to_string(),
            quote_asset: "USDT".to_string(),
            base_precision: 1,
            quote_precision: 4,
        }
    }

    #[test]
    fn test_trunc_rounds_half_away_from_zero() {
        let info = btrusdt();
        assert_eq!(info.trunc_price(dec("0.12345")), dec("0.1235"));
        assert_eq!(info.trunc_price(dec("0.12344")), dec("0.1234"));
        assert_eq!(info.trunc_amount(dec("10.25")), dec("10.3"));
        assert_eq!(info.trunc_amount(dec("-10.25")), dec("-10.3"));
        assert_eq!(info.tick_size(), dec("0.0001"));
    }

    #[test]
    fn test_exchange_info_lookup_ignores_case() {
        let info: ExchangeInfo = serde_json::from_str(
            r#"{"timezone":"UTC","symbols":[{"symbol":"BTRUSDT","status":"TRADING","baseAsset":"btr","quoteAsset":"usdt","baseAssetPrecision":1,"quotePrecision":4}]}"#,
        )
        .unwrap();

        let symbol = info.symbol("btrusdt").unwrap();
        assert_eq!(symbol.quote_precision, 4);
        assert!(info.symbol("ethusdt").is_none());
    }

    #[test]
    fn test_order_id_as_string_or_number() {
        let as_string: OrderData = serde_json::from_str(
            r#"{"symbol":"BTRUSDT","orderId":"123456","price":"0.1","origQty":"100","executedQty":"40","side":"BUY","type":"LIMIT","status":"PARTIALLY_FILLED","time":1,"updateTime":2}"#,
        )
        .unwrap();
        assert_eq!(as_string.order_id, 123_456);
        assert!(!as_string.is_filled());
        assert_eq!(as_string.unfilled_quantity(), dec("60"));

        let as_number: OrderAck =
            serde_json::from_str(r#"{"symbol":"BTRUSDT","orderId":42,"transactTime":1}"#).unwrap();
        assert_eq!(as_number.order_id, 42);
    }

    #[test]
    fn test_rest_depth_helpers() {
        let depth: RestDepth = serde_json::from_str(
            r#"{"lastUpdateId":7,"bids":[["0.1010","5"],["0.1000","7"]],"asks":[["0.1020","3"]]}"#,
        )
        .unwrap();

        assert_eq!(depth.spread(), Some(dec("0.0010")));
        assert_eq!(depth.bid_quantity_through(1), dec("12"));
        assert_eq!(depth.ask_quantity_through(5), dec("3"));
        assert_eq!(depth.bid_levels().count(), 2);
    }

    #[test]
    fn test_depth_message_maps_buys_to_bids() {
        let message: DepthMessage = serde_json::from_str(
            r#"{"channel":"market_btrusdt_depth_step0","ts":1700000000000,"tick":{"buys":[[0.101,5]],"asks":[[0.102,3]]}}"#,
        )
        .unwrap();

        let update = message.into_update().unwrap();
        assert_eq!(update.bids[0].price, dec("0.101"));
        assert_eq!(update.asks[0].quantity, dec("3"));
        assert_eq!(update.timestamp, 1_700_000_000_000);
    }

    #[test]
    fn test_message_without_tick_is_not_an_update() {
        let message: KlineMessage =
            serde_json::from_str(r#"{"channel":"market_btrusdt_kline_1min","ts":1}"#).unwrap();
        assert!(message.into_update().is_none());
    }

    #[test]
    fn test_account_balance_lookup() {
        let account: AccountData = serde_json::from_str(
            r#"{"updateTime":1,"balances":[{"asset":"btr","free":"10.5","locked":"0.5"}]}"#,
        )
        .unwrap();
        let balance = Balance::from(account.balance("BTR").unwrap().clone());
        assert_eq!(balance.total(), dec("11"));
    }
}
