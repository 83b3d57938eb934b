use crate::core::errors::{DecodeError, ExchangeError};
use crate::core::kernel::WsCodec;
use crate::core::types::{DepthUpdate, KlineInterval, KlineUpdate, StreamSubscription};
use crate::exchanges::bitrue::types::{DepthMessage, KlineMessage, SubscribeAck};
use serde_json::json;
use tokio_tungstenite::tungstenite::Message;

const HEARTBEAT_MARKER: &[u8] = b"ping";

/// `market_<symbol>_depth_step0`
pub fn depth_channel(symbol: &str) -> String {
    format!("market_{}_depth_step0", symbol.to_lowercase())
}

/// `market_<symbol>_kline_<interval>`
pub fn kline_channel(symbol: &str, interval: KlineInterval) -> String {
    format!(
        "market_{}_kline_{}",
        symbol.to_lowercase(),
        interval.as_channel_suffix()
    )
}

pub fn depth_subscription(symbol: &str) -> StreamSubscription {
    let symbol = symbol.to_lowercase();
    StreamSubscription::new(depth_channel(&symbol), symbol.clone(), symbol)
}

pub fn kline_subscription(symbol: &str, interval: KlineInterval) -> StreamSubscription {
    let symbol = symbol.to_lowercase();
    StreamSubscription::new(kline_channel(&symbol, interval), symbol.clone(), symbol)
}

fn encode_subscription(subscription: &StreamSubscription) -> Message {
    let request = json!({
        "event": "sub",
        "params": {
            "cb_id": subscription.callback_id,
            "channel": subscription.channel,
        }
    });
    Message::Text(request.to_string())
}

fn decode_subscription_ack(
    subscription: &StreamSubscription,
    payload: &[u8],
) -> Result<(), ExchangeError> {
    let rejected = |status: String| ExchangeError::SubscribeRejected {
        channel: subscription.channel.clone(),
        status,
    };

    let ack: SubscribeAck = serde_json::from_slice(payload)
        .map_err(|_| rejected(String::from_utf8_lossy(payload).into_owned()))?;

    if ack.is_ok() {
        Ok(())
    } else {
        Err(rejected(ack.status.unwrap_or_else(|| "missing".to_string())))
    }
}

/// Heartbeat frames look like `{"ping":<ms>}`
fn is_heartbeat(payload: &[u8]) -> bool {
    payload.get(2..6) == Some(HEARTBEAT_MARKER)
}

fn encode_heartbeat_reply(now_ms: u64) -> Message {
    Message::Text(format!("{{\"pong\":{}}}", now_ms))
}

fn decode_json<'a, T: serde::Deserialize<'a>>(payload: &'a [u8]) -> Result<T, ExchangeError> {
    let text = std::str::from_utf8(payload).map_err(DecodeError::from)?;
    let value: T = serde_json::from_str(text).map_err(DecodeError::from)?;
    Ok(value)
}

/// Order book depth feed
#[derive(Debug, Clone, Copy, Default)]
pub struct BitrueDepthCodec;

impl WsCodec for BitrueDepthCodec {
    type Message = DepthUpdate;

    fn encode_subscription(
        &self,
        subscription: &StreamSubscription,
    ) -> Result<Message, ExchangeError> {
        Ok(encode_subscription(subscription))
    }

    fn decode_subscription_ack(
        &self,
        subscription: &StreamSubscription,
        payload: &[u8],
    ) -> Result<(), ExchangeError> {
        decode_subscription_ack(subscription, payload)
    }

    fn is_heartbeat(&self, payload: &[u8]) -> bool {
        is_heartbeat(payload)
    }

    fn encode_heartbeat_reply(&self, now_ms: u64) -> Message {
        encode_heartbeat_reply(now_ms)
    }

    fn decode_message(&self, payload: &[u8]) -> Result<Option<Self::Message>, ExchangeError> {
        let message: DepthMessage = decode_json(payload)?;
        Ok(message.into_update())
    }
}

/// Candle feed
#[derive(Debug, Clone, Copy, Default)]
pub struct BitrueKlineCodec;

impl WsCodec for BitrueKlineCodec {
    type Message = KlineUpdate;

    fn encode_subscription(
        &self,
        subscription: &StreamSubscription,
    ) -> Result<Message, ExchangeError> {
        Ok(encode_subscription(subscription))
    }

    fn decode_subscription_ack(
        &self,
        subscription: &StreamSubscription,
        payload: &[u8],
    ) -> Result<(), ExchangeError> {
        decode_subscription_ack(subscription, payload)
    }

    fn is_heartbeat(&self, payload: &[u8]) -> bool {
        is_heartbeat(payload)
    }

    fn encode_heartbeat_reply(&self, now_ms: u64) -> Message {
        encode_heartbeat_reply(now_ms)
    }

    fn decode_message(&self, payload: &[u8]) -> Result<Option<Self::Message>, ExchangeError> {
        let message: KlineMessage = decode_json(payload)?;
        Ok(message.into_update())
    }
}
