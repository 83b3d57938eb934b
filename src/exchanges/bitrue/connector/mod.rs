use crate::core::config::ExchangeConfig;
use crate::core::errors::ExchangeError;
use crate::core::kernel::{Clock, RestClient, StreamHandle, WsConfig};
use crate::core::traits::{AccountInfo, ExchangeConnector, MarketDataSource, OrderPlacer};
use crate::core::types::{Balance, DepthUpdate, KlineInterval, KlineUpdate, OrderRequest};
use async_trait::async_trait;
use std::sync::Arc;

pub mod account;
pub mod market_data;
pub mod trading;

pub use account::Account;
pub use market_data::MarketData;
pub use trading::Trading;

/// Bitrue connector that composes all sub-trait implementations
pub struct BitrueConnector<R: RestClient> {
    pub market: MarketData<R>,
    pub trading: Trading<R>,
    pub account: Account<R>,
}

impl<R: RestClient + Clone> BitrueConnector<R> {
    pub fn new(rest: R, config: &ExchangeConfig) -> Self {
        let ws_config = WsConfig::default().with_buffer_capacity(config.stream_buffer);
        Self {
            market: MarketData::new(&rest, config.stream_url().to_string())
                .with_ws_config(ws_config),
            trading: Trading::new(&rest),
            account: Account::new(&rest),
        }
    }

    /// Replace the clock used for heartbeat replies
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.market = self.market.with_clock(clock);
        self
    }
}

// Implement traits for the connector by delegating to sub-components
#[async_trait]
impl<R: RestClient> MarketDataSource for BitrueConnector<R> {
    async fn subscribe_depth(
        &self,
        symbol: &str,
    ) -> Result<StreamHandle<DepthUpdate>, ExchangeError> {
        self.market.subscribe_depth(symbol).await
    }

    async fn subscribe_kline(
        &self,
        symbol: &str,
        interval: KlineInterval,
    ) -> Result<StreamHandle<KlineUpdate>, ExchangeError> {
        self.market.subscribe_kline(symbol, interval).await
    }

    fn get_websocket_url(&self) -> String {
        self.market.get_websocket_url()
    }
}

#[async_trait]
impl<R: RestClient> OrderPlacer for BitrueConnector<R> {
    async fn place_order(&self, order: OrderRequest) -> Result<u64, ExchangeError> {
        self.trading.place_order(order).await
    }

    async fn cancel_order(&self, symbol: &str, order_id: u64) -> Result<(), ExchangeError> {
        self.trading.cancel_order(symbol, order_id).await
    }
}

#[async_trait]
impl<R: RestClient> AccountInfo for BitrueConnector<R> {
    async fn get_account_balance(&self) -> Result<Vec<Balance>, ExchangeError> {
        self.account.get_account_balance().await
    }
}

impl<R: RestClient> ExchangeConnector for BitrueConnector<R> {}
