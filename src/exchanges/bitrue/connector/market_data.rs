use crate::core::errors::ExchangeError;
use crate::core::kernel::{
    Clock, RestClient, StreamHandle, StreamSession, SystemClock, WsCodec, WsConfig,
};
use crate::core::traits::MarketDataSource;
use crate::core::types::{DepthUpdate, KlineInterval, KlineUpdate, StreamSubscription};
use crate::exchanges::bitrue::codec::{
    depth_subscription, kline_subscription, BitrueDepthCodec, BitrueKlineCodec,
};
use crate::exchanges::bitrue::rest::BitrueRestClient;
use crate::exchanges::bitrue::types::{BookTicker, ExchangeInfo, PriceTicker, RestDepth, SymbolInfo};
use crate::exchanges::bitrue::EXCHANGE_NAME;
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::instrument;

/// Market data for Bitrue: REST snapshots plus one stream session per feed
pub struct MarketData<R: RestClient> {
    rest: BitrueRestClient<R>,
    ws_url: String,
    ws_config: WsConfig,
    clock: Arc<dyn Clock>,
}

impl<R: RestClient> MarketData<R> {
    pub fn new(rest: &R, ws_url: String) -> Self
    where
        R: Clone,
    {
        Self {
            rest: BitrueRestClient::new(rest.clone()),
            ws_url,
            ws_config: WsConfig::default(),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_ws_config(mut self, ws_config: WsConfig) -> Self {
        self.ws_config = ws_config;
        self
    }

    /// Clock used to stamp heartbeat replies on new sessions
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    #[instrument(skip(self), fields(exchange = EXCHANGE_NAME))]
    pub async fn exchange_info(&self) -> Result<ExchangeInfo, ExchangeError> {
        self.rest.get_exchange_info().await
    }

    /// Trading rules for one symbol, `None` if the venue does not list it
    #[instrument(skip(self), fields(exchange = EXCHANGE_NAME))]
    pub async fn symbol_info(&self, symbol: &str) -> Result<Option<SymbolInfo>, ExchangeError> {
        let info = self.rest.get_exchange_info().await?;
        Ok(info.symbol(symbol).cloned())
    }

    #[instrument(skip(self), fields(exchange = EXCHANGE_NAME))]
    pub async fn depth(
        &self,
        symbol: &str,
        limit: Option<u32>,
    ) -> Result<RestDepth, ExchangeError> {
        self.rest.get_depth(symbol, limit).await
    }

    #[instrument(skip(self), fields(exchange = EXCHANGE_NAME))]
    pub async fn ticker_price(&self, symbol: &str) -> Result<PriceTicker, ExchangeError> {
        self.rest.get_ticker_price(symbol).await
    }

    #[instrument(skip(self), fields(exchange = EXCHANGE_NAME))]
    pub async fn book_ticker(&self, symbol: &str) -> Result<BookTicker, ExchangeError> {
        self.rest.get_book_ticker(symbol).await
    }

    /// Best bid
    pub async fn buy_price(&self, symbol: &str) -> Result<Decimal, ExchangeError> {
        Ok(self.book_ticker(symbol).await?.bid_price)
    }

    /// Best ask
    pub async fn sell_price(&self, symbol: &str) -> Result<Decimal, ExchangeError> {
        Ok(self.book_ticker(symbol).await?.ask_price)
    }

    /// Start a session for any feed; each call opens its own connection
    pub async fn open_stream<C: WsCodec>(
        &self,
        codec: C,
        subscription: StreamSubscription,
    ) -> Result<StreamHandle<C::Message>, ExchangeError> {
        let mut session = StreamSession::new(
            self.ws_url.clone(),
            EXCHANGE_NAME.to_string(),
            codec,
            subscription,
        )
        .with_config(self.ws_config.clone())
        .with_clock(self.clock.clone());

        session.start().await
    }

    pub fn ws_url(&self) -> &str {
        &self.ws_url
    }
}

#[async_trait]
impl<R: RestClient> MarketDataSource for MarketData<R> {
    #[instrument(skip(self), fields(exchange = EXCHANGE_NAME))]
    async fn subscribe_depth(
        &self,
        symbol: &str,
    ) -> Result<StreamHandle<DepthUpdate>, ExchangeError> {
        self.open_stream(BitrueDepthCodec, depth_subscription(symbol))
            .await
    }

    #[instrument(skip(self), fields(exchange = EXCHANGE_NAME, interval = %interval))]
    async fn subscribe_kline(
        &self,
        symbol: &str,
        interval: KlineInterval,
    ) -> Result<StreamHandle<KlineUpdate>, ExchangeError> {
        self.open_stream(BitrueKlineCodec, kline_subscription(symbol, interval))
            .await
    }

    fn get_websocket_url(&self) -> String {
        self.ws_url.clone()
    }
}
