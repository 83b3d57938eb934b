pub mod codec;
pub mod connector;
pub mod rest;
pub mod types;

use crate::core::config::ExchangeConfig;
use crate::core::errors::ExchangeError;
use crate::core::kernel::{HmacSigner, ReqwestRest, RestClientBuilder, RestClientConfig};
use std::sync::Arc;

// Re-export main types for easier importing
pub use codec::{
    depth_channel, depth_subscription, kline_channel, kline_subscription, BitrueDepthCodec,
    BitrueKlineCodec,
};
pub use connector::BitrueConnector;
pub use rest::BitrueRestClient;
pub use types::{
    AccountData, BalanceData, BookTicker, CancelAck, ExchangeInfo, OrderAck, OrderData,
    PriceTicker, RestDepth, SymbolInfo,
};

pub const EXCHANGE_NAME: &str = "bitrue";

/// Build the REST transport for a configuration, signing only when credentials are present
pub fn build_rest_client(config: &ExchangeConfig) -> Result<ReqwestRest, ExchangeError> {
    let rest_config =
        RestClientConfig::new(config.rest_url().to_string(), EXCHANGE_NAME.to_string())
            .with_timeout(config.request_timeout_secs);
    let mut rest_builder = RestClientBuilder::new(rest_config);

    if config.has_credentials() {
        let signer = Arc::new(HmacSigner::new(config.credentials.clone()));
        rest_builder = rest_builder.with_signer(signer);
    }

    rest_builder.build()
}

/// Create a Bitrue connector from configuration
pub fn create_bitrue_connector(
    config: ExchangeConfig,
) -> Result<BitrueConnector<ReqwestRest>, ExchangeError> {
    let rest = build_rest_client(&config)?;
    Ok(BitrueConnector::new(rest, &config))
}
