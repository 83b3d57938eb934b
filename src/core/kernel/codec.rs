use crate::core::errors::ExchangeError;
use crate::core::types::StreamSubscription;
use tokio_tungstenite::tungstenite::Message;

/// Codec trait for venue-specific stream message handling
///
/// The session hands every codec method already-decompressed payload bytes;
/// gzip framing is handled by the kernel before the codec sees anything.
pub trait WsCodec: Send + Sync + 'static {
    /// The typed record this feed produces
    type Message: Clone + Send + Sync + 'static;

    /// Encode the subscribe control message for one feed
    fn encode_subscription(
        &self,
        subscription: &StreamSubscription,
    ) -> Result<Message, ExchangeError>;

    /// Inspect the single response frame to a subscribe request
    ///
    /// # Returns
    /// - `Ok(())` - the venue acknowledged the subscription
    /// - `Err(ExchangeError::SubscribeRejected { .. })` - anything else
    fn decode_subscription_ack(
        &self,
        subscription: &StreamSubscription,
        payload: &[u8],
    ) -> Result<(), ExchangeError>;

    /// Whether the payload is an application-level heartbeat
    fn is_heartbeat(&self, payload: &[u8]) -> bool;

    /// Reply to a heartbeat, stamped with `now_ms`
    fn encode_heartbeat_reply(&self, now_ms: u64) -> Message;

    /// Decode a data payload into a typed message
    ///
    /// # Returns
    /// - `Ok(Some(message))` - Successfully decoded message
    /// - `Ok(None)` - Payload was a control/status frame and is ignored
    /// - `Err(error)` - Failed to decode message
    fn decode_message(&self, payload: &[u8]) -> Result<Option<Self::Message>, ExchangeError>;
}
