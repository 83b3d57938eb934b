use crate::core::errors::ExchangeError;
use crate::core::kernel::{RequestParams, RestClient};
use crate::core::types::OrderRequest;
use crate::exchanges::bitrue::types::{
    AccountData, BookTicker, CancelAck, ExchangeInfo, OrderAck, OrderData, PriceTicker, RestDepth,
};
use reqwest::Method;

pub const EXCHANGE_INFO_ENDPOINT: &str = "/api/v1/exchangeInfo";
pub const DEPTH_ENDPOINT: &str = "/api/v1/depth";
pub const TICKER_PRICE_ENDPOINT: &str = "/api/v1/ticker/price";
pub const BOOK_TICKER_ENDPOINT: &str = "/api/v1/ticker/bookTicker";
pub const ORDER_ENDPOINT: &str = "/api/v1/order";
pub const OPEN_ORDERS_ENDPOINT: &str = "/api/v1/openOrders";
pub const ALL_ORDERS_ENDPOINT: &str = "/api/v1/allOrders";
pub const ACCOUNT_ENDPOINT: &str = "/api/v1/account";

/// Thin typed wrapper around `RestClient` for the Bitrue API
#[derive(Debug, Clone)]
pub struct BitrueRestClient<R: RestClient> {
    client: R,
}

impl<R: RestClient> BitrueRestClient<R> {
    pub fn new(client: R) -> Self {
        Self { client }
    }

    pub fn inner(&self) -> &R {
        &self.client
    }

    /// Trading rules and symbol information
    pub async fn get_exchange_info(&self) -> Result<ExchangeInfo, ExchangeError> {
        self.client
            .get_json(EXCHANGE_INFO_ENDPOINT, &RequestParams::new())
            .await
    }

    /// Order book snapshot
    pub async fn get_depth(
        &self,
        symbol: &str,
        limit: Option<u32>,
    ) -> Result<RestDepth, ExchangeError> {
        let params = RequestParams::new()
            .with("symbol", symbol)
            .with_opt("limit", limit);
        self.client.get_json(DEPTH_ENDPOINT, &params).await
    }

    /// Latest trade price
    pub async fn get_ticker_price(&self, symbol: &str) -> Result<PriceTicker, ExchangeError> {
        let params = RequestParams::new().with("symbol", symbol);
        self.client.get_json(TICKER_PRICE_ENDPOINT, &params).await
    }

    /// Best bid and ask
    pub async fn get_book_ticker(&self, symbol: &str) -> Result<BookTicker, ExchangeError> {
        let params = RequestParams::new().with("symbol", symbol);
        self.client.get_json(BOOK_TICKER_ENDPOINT, &params).await
    }

    /// Place an order
    pub async fn place_order(&self, order: &OrderRequest) -> Result<OrderAck, ExchangeError> {
        let params = RequestParams::new()
            .with("symbol", order.symbol.as_str())
            .with("side", order.side.as_str())
            .with("type", order.order_type.as_str())
            .with("quantity", order.quantity)
            .with_opt("price", order.price);
        self.client
            .signed_request_json(Method::POST, ORDER_ENDPOINT, &params)
            .await
    }

    pub async fn query_order(
        &self,
        symbol: &str,
        order_id: u64,
    ) -> Result<OrderData, ExchangeError> {
        let params = RequestParams::new()
            .with("symbol", symbol)
            .with("orderId", order_id);
        self.client
            .signed_request_json(Method::GET, ORDER_ENDPOINT, &params)
            .await
    }

    pub async fn cancel_order(
        &self,
        symbol: &str,
        order_id: u64,
    ) -> Result<CancelAck, ExchangeError> {
        let params = RequestParams::new()
            .with("symbol", symbol)
            .with("orderId", order_id);
        self.client
            .signed_request_json(Method::DELETE, ORDER_ENDPOINT, &params)
            .await
    }

    pub async fn get_open_orders(&self, symbol: &str) -> Result<Vec<OrderData>, ExchangeError> {
        let params = RequestParams::new().with("symbol", symbol);
        self.client
            .signed_request_json(Method::GET, OPEN_ORDERS_ENDPOINT, &params)
            .await
    }

    /// Order history, optionally starting from `from_order_id`
    pub async fn get_all_orders(
        &self,
        symbol: &str,
        from_order_id: Option<u64>,
    ) -> Result<Vec<OrderData>, ExchangeError> {
        let params = RequestParams::new()
            .with("symbol", symbol)
            .with_opt("orderId", from_order_id.filter(|id| *id > 0));
        self.client
            .signed_request_json(Method::GET, ALL_ORDERS_ENDPOINT, &params)
            .await
    }

    pub async fn get_account(&self) -> Result<AccountData, ExchangeError> {
        self.client
            .signed_request_json(Method::GET, ACCOUNT_ENDPOINT, &RequestParams::new())
            .await
    }
}
