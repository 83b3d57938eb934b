use crate::core::{
    errors::ExchangeError,
    kernel::StreamHandle,
    types::{Balance, DepthUpdate, KlineInterval, KlineUpdate, OrderRequest},
};
use async_trait::async_trait;

#[async_trait]
pub trait MarketDataSource {
    /// Open a depth stream for one symbol
    async fn subscribe_depth(&self, symbol: &str)
        -> Result<StreamHandle<DepthUpdate>, ExchangeError>;

    /// Open a candle stream for one symbol and interval
    async fn subscribe_kline(
        &self,
        symbol: &str,
        interval: KlineInterval,
    ) -> Result<StreamHandle<KlineUpdate>, ExchangeError>;

    /// Get WebSocket endpoint URL for market data
    fn get_websocket_url(&self) -> String;
}

#[async_trait]
pub trait OrderPlacer {
    /// Place a new order, returning the venue order id
    async fn place_order(&self, order: OrderRequest) -> Result<u64, ExchangeError>;

    /// Cancel an open order
    async fn cancel_order(&self, symbol: &str, order_id: u64) -> Result<(), ExchangeError>;
}

#[async_trait]
pub trait AccountInfo {
    async fn get_account_balance(&self) -> Result<Vec<Balance>, ExchangeError>;
}

#[async_trait]
pub trait ExchangeConnector: MarketDataSource + OrderPlacer + AccountInfo {}
