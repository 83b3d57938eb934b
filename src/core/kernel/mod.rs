/// Transport kernel for the Bitrue client
///
/// The kernel holds everything that moves bytes and nothing that knows what
/// the bytes mean. Venue-specific knowledge (endpoint paths, channel names,
/// record shapes) lives under `exchanges::bitrue` and plugs in through the
/// `Signer` and `WsCodec` traits.
///
/// ## Request side
/// - `RequestParams` / `canonicalize`: deterministic `key=value&...` encoding
/// - `HmacSigner`: HMAC-SHA256 over the canonical string plus timestamp
/// - `RestClient` / `ReqwestRest`: signed form requests and public GETs
///
/// ## Stream side
/// - `FrameDecoder`: gzip inflate with plain-text passthrough
/// - `WsCodec`: subscribe, ack, heartbeat and payload handling per feed
/// - `StreamSession` / `StreamHandle`: one connection, one subscription,
///   one supervised receive task
///
/// # Example
/// ```rust,no_run
/// use bitrue_client::core::config::ExchangeConfig;
/// use bitrue_client::core::kernel::*;
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = ExchangeConfig::new("api_key".to_string(), "secret_key".to_string());
/// let rest = RestClientBuilder::new(RestClientConfig::new(
///     config.rest_url().to_string(),
///     "bitrue".to_string(),
/// ))
/// .with_signer(Arc::new(HmacSigner::new(config.credentials.clone())))
/// .build()?;
///
/// let params = RequestParams::new().with("symbol", "BTRUSDT");
/// let body = rest.get("/api/v1/depth", &params).await?;
/// println!("{}", body);
/// # Ok(())
/// # }
/// ```
pub mod canonical;
pub mod channel;
pub mod clock;
pub mod codec;
pub mod frame;
pub mod rest;
pub mod signer;
pub mod ws;

// Re-export key types for convenience
pub use canonical::{canonicalize, ParamValue, RequestParams};
pub use channel::{update_channel, StreamStats, UpdatePublisher, UpdateReceiver};
pub use clock::{Clock, FixedClock, SystemClock};
pub use codec::WsCodec;
pub use frame::FrameDecoder;
pub use rest::{
    ApiErrorBody, ApiResponse, ReqwestRest, RestClient, RestClientBuilder, RestClientConfig,
};
pub use signer::{hmac_sha256_hex, sign, HmacSigner, SignatureResult, SignedPayload, Signer};
pub use ws::{StreamHandle, StreamSession, WsConfig};
