use crate::core::errors::ExchangeError;
use crate::core::kernel::RestClient;
use crate::core::traits::OrderPlacer;
use crate::core::types::{OrderRequest, OrderSide, OrderType};
use crate::exchanges::bitrue::rest::BitrueRestClient;
use crate::exchanges::bitrue::types::{CancelAck, OrderAck, OrderData};
use crate::exchanges::bitrue::EXCHANGE_NAME;
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashMap;
use tracing::{info, instrument};

/// Trading implementation for Bitrue
pub struct Trading<R: RestClient> {
    rest: BitrueRestClient<R>,
}

impl<R: RestClient> Trading<R> {
    pub fn new(rest: &R) -> Self
    where
        R: Clone,
    {
        Self {
            rest: BitrueRestClient::new(rest.clone()),
        }
    }

    /// Validate and submit an order, returning the venue acknowledgement
    #[instrument(
        skip(self, order),
        fields(exchange = EXCHANGE_NAME, symbol = %order.symbol, side = %order.side)
    )]
    pub async fn submit(&self, order: &OrderRequest) -> Result<OrderAck, ExchangeError> {
        if order.order_type == OrderType::Limit && order.price.is_none() {
            return Err(ExchangeError::InvalidParameters(
                "Price is required for limit orders".to_string(),
            ));
        }
        if order.quantity <= Decimal::ZERO {
            return Err(ExchangeError::InvalidParameters(format!(
                "Quantity must be positive, got {}",
                order.quantity
            )));
        }

        let ack = self.rest.place_order(order).await?;
        info!(order_id = ack.order_id, "order accepted");
        Ok(ack)
    }

    pub async fn buy_limit(
        &self,
        symbol: &str,
        price: Decimal,
        quantity: Decimal,
    ) -> Result<u64, ExchangeError> {
        let order = OrderRequest::limit(symbol, OrderSide::Buy, price, quantity);
        Ok(self.submit(&order).await?.order_id)
    }

    pub async fn sell_limit(
        &self,
        symbol: &str,
        price: Decimal,
        quantity: Decimal,
    ) -> Result<u64, ExchangeError> {
        let order = OrderRequest::limit(symbol, OrderSide::Sell, price, quantity);
        Ok(self.submit(&order).await?.order_id)
    }

    #[instrument(skip(self), fields(exchange = EXCHANGE_NAME))]
    pub async fn query_order(
        &self,
        symbol: &str,
        order_id: u64,
    ) -> Result<OrderData, ExchangeError> {
        self.rest.query_order(symbol, order_id).await
    }

    #[instrument(skip(self), fields(exchange = EXCHANGE_NAME))]
    pub async fn open_orders(&self, symbol: &str) -> Result<Vec<OrderData>, ExchangeError> {
        self.rest.get_open_orders(symbol).await
    }

    #[instrument(skip(self), fields(exchange = EXCHANGE_NAME))]
    pub async fn all_orders(
        &self,
        symbol: &str,
        from_order_id: Option<u64>,
    ) -> Result<Vec<OrderData>, ExchangeError> {
        self.rest.get_all_orders(symbol, from_order_id).await
    }

    /// Open orders keyed by order id
    pub async fn order_map(&self, symbol: &str) -> Result<HashMap<u64, OrderData>, ExchangeError> {
        let orders = self.open_orders(symbol).await?;
        Ok(orders
            .into_iter()
            .map(|order| (order.order_id, order))
            .collect())
    }

    #[instrument(skip(self), fields(exchange = EXCHANGE_NAME))]
    pub async fn cancel(&self, symbol: &str, order_id: u64) -> Result<CancelAck, ExchangeError> {
        self.rest.cancel_order(symbol, order_id).await
    }
}

#[async_trait]
impl<R: RestClient> OrderPlacer for Trading<R> {
    async fn place_order(&self, order: OrderRequest) -> Result<u64, ExchangeError> {
        Ok(self.submit(&order).await?.order_id)
    }

    async fn cancel_order(&self, symbol: &str, order_id: u64) -> Result<(), ExchangeError> {
        self.cancel(symbol, order_id).await?;
        Ok(())
    }
}
