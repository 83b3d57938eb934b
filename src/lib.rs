pub mod core;
pub mod exchanges;

pub use core::{
    config::{Credentials, ExchangeConfig},
    errors::ExchangeError,
    traits::{AccountInfo, ExchangeConnector, MarketDataSource, OrderPlacer},
    types::*,
};
pub use exchanges::bitrue::{create_bitrue_connector, BitrueConnector};
