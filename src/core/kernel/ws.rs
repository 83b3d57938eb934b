use crate::core::config::DEFAULT_STREAM_BUFFER;
use crate::core::errors::ExchangeError;
use crate::core::kernel::channel::{update_channel, StreamStats, UpdatePublisher, UpdateReceiver};
use crate::core::kernel::clock::{Clock, SystemClock};
use crate::core::kernel::codec::WsCodec;
use crate::core::kernel::frame::FrameDecoder;
use crate::core::types::{SessionState, StreamSubscription};
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_tungstenite::{
    connect_async, tungstenite::protocol::Message, MaybeTlsStream, WebSocketStream,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, instrument, trace, warn, Instrument};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Streaming session configuration
#[derive(Debug, Clone)]
pub struct WsConfig {
    /// Connection timeout in milliseconds
    pub connect_timeout_ms: u64,
    /// How long to wait for the subscribe response frame
    pub subscribe_timeout_ms: u64,
    /// Capacity of the drop-oldest update buffer
    pub buffer_capacity: usize,
}

impl Default for WsConfig {
    fn default() -> Self {
        Self {
            connect_timeout_ms: 10_000,
            subscribe_timeout_ms: 10_000,
            buffer_capacity: DEFAULT_STREAM_BUFFER,
        }
    }
}

impl WsConfig {
    pub fn with_buffer_capacity(mut self, capacity: usize) -> Self {
        self.buffer_capacity = capacity;
        self
    }
}

/// One WebSocket connection carrying one subscription.
///
/// `start` walks `Connecting -> Subscribing -> Streaming`; once streaming, a
/// dedicated task owns the socket until the remote closes it, a read fails,
/// the consumer goes away, or the handle is closed. There is no reconnect
/// here; callers layer that on top by starting a fresh session.
pub struct StreamSession<C: WsCodec> {
    url: String,
    exchange_name: String,
    codec: Arc<C>,
    subscription: StreamSubscription,
    config: WsConfig,
    clock: Arc<dyn Clock>,
    state: Arc<watch::Sender<SessionState>>,
}

impl<C: WsCodec> StreamSession<C> {
    /// Create a new session with the specified codec
    ///
    /// # Arguments
    /// * `url` - The WebSocket URL to connect to
    /// * `exchange_name` - Name of the exchange for logging/tracing
    /// * `codec` - Venue codec for this feed
    /// * `subscription` - The feed to subscribe to
    pub fn new(
        url: String,
        exchange_name: String,
        codec: C,
        subscription: StreamSubscription,
    ) -> Self {
        let (state, _) = watch::channel(SessionState::Connecting);
        Self {
            url,
            exchange_name,
            codec: Arc::new(codec),
            subscription,
            config: WsConfig::default(),
            clock: Arc::new(SystemClock),
            state: Arc::new(state),
        }
    }

    pub fn with_config(mut self, config: WsConfig) -> Self {
        self.config = config;
        self
    }

    /// Clock used to stamp heartbeat replies
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    pub fn subscription(&self) -> &StreamSubscription {
        &self.subscription
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn transition(&self, next: SessionState) {
        let previous = self.state.send_replace(next);
        debug!(from = %previous, to = %next, "session state change");
    }

    /// Connect, subscribe and spawn the receive task
    ///
    /// On any failure the session ends in `Closed` and the error is returned;
    /// `Streaming` is only entered after the venue acknowledged the subscription.
    #[instrument(
        skip(self),
        fields(exchange = %self.exchange_name, channel = %self.subscription.channel)
    )]
    pub async fn start(&mut self) -> Result<StreamHandle<C::Message>, ExchangeError> {
        let current = self.state();
        if current != SessionState::Connecting {
            return Err(ExchangeError::InvalidParameters(format!(
                "session cannot be started from state {}",
                current
            )));
        }

        let mut stream = match self.connect().await {
            Ok(stream) => stream,
            Err(e) => {
                self.transition(SessionState::Closed);
                return Err(e);
            }
        };

        self.transition(SessionState::Subscribing);
        if let Err(e) = self.subscribe(&mut stream).await {
            warn!(error = %e, "subscription failed");
            let _ = tokio::time::timeout(Duration::from_secs(1), stream.close(None)).await;
            self.transition(SessionState::Closed);
            return Err(e);
        }

        self.transition(SessionState::Streaming);
        info!("subscription confirmed, streaming");

        let stats = Arc::new(StreamStats::default());
        let (publisher, receiver) = update_channel(self.config.buffer_capacity, stats.clone());
        let cancel = CancellationToken::new();

        let receive_loop = ReceiveLoop {
            codec: self.codec.clone(),
            clock: self.clock.clone(),
            publisher,
            stats,
            cancel: cancel.clone(),
            state: self.state.clone(),
        };
        let span = info_span!(
            "stream",
            exchange = %self.exchange_name,
            channel = %self.subscription.channel
        );
        let task = tokio::spawn(receive_loop.run(stream).instrument(span));

        Ok(StreamHandle {
            receiver,
            cancel,
            task: Some(task),
            state: self.state.subscribe(),
            subscription: self.subscription.clone(),
        })
    }

    async fn connect(&self) -> Result<WsStream, ExchangeError> {
        let connect_timeout = Duration::from_millis(self.config.connect_timeout_ms);

        let (ws_stream, _) = tokio::time::timeout(connect_timeout, connect_async(self.url.as_str()))
            .await
            .map_err(|_| {
                ExchangeError::Connect(format!(
                    "WebSocket connection timeout after {}ms",
                    self.config.connect_timeout_ms
                ))
            })?
            .map_err(|e| ExchangeError::Connect(format!("WebSocket connection failed: {}", e)))?;

        debug!(url = %self.url, "connected");
        Ok(ws_stream)
    }

    async fn subscribe(&self, stream: &mut WsStream) -> Result<(), ExchangeError> {
        let request = self.codec.encode_subscription(&self.subscription)?;
        stream
            .send(request)
            .await
            .map_err(|e| ExchangeError::Connect(format!("Failed to send subscription: {}", e)))?;

        let subscribe_timeout = Duration::from_millis(self.config.subscribe_timeout_ms);
        let frame = tokio::time::timeout(subscribe_timeout, next_payload_frame(stream))
            .await
            .map_err(|_| {
                ExchangeError::Connect(format!(
                    "No subscription response within {}ms",
                    self.config.subscribe_timeout_ms
                ))
            })??;

        let payload =
            FrameDecoder
                .decode(&frame)
                .map_err(|e| ExchangeError::SubscribeRejected {
                    channel: self.subscription.channel.clone(),
                    status: format!("undecodable response: {}", e),
                })?;
        trace!(response = %String::from_utf8_lossy(&payload), "subscription response");

        self.codec
            .decode_subscription_ack(&self.subscription, &payload)
    }
}

/// Read until the next text/binary frame, answering transport pings on the way
async fn next_payload_frame(stream: &mut WsStream) -> Result<Vec<u8>, ExchangeError> {
    loop {
        match stream.next().await {
            Some(Ok(Message::Text(text))) => return Ok(text.into_bytes()),
            Some(Ok(Message::Binary(data))) => return Ok(data),
            Some(Ok(Message::Ping(data))) => {
                stream.send(Message::Pong(data)).await.map_err(|e| {
                    ExchangeError::Connect(format!("Failed to answer ping: {}", e))
                })?;
            }
            Some(Ok(Message::Pong(_) | Message::Frame(_))) => {}
            Some(Ok(Message::Close(frame))) => {
                return Err(ExchangeError::Connect(format!(
                    "Connection closed during subscribe: {:?}",
                    frame
                )));
            }
            Some(Err(e)) => {
                return Err(ExchangeError::Connect(format!("WebSocket error: {}", e)));
            }
            None => {
                return Err(ExchangeError::Connect(
                    "Connection ended during subscribe".to_string(),
                ));
            }
        }
    }
}

struct ReceiveLoop<C: WsCodec> {
    codec: Arc<C>,
    clock: Arc<dyn Clock>,
    publisher: UpdatePublisher<C::Message>,
    stats: Arc<StreamStats>,
    cancel: CancellationToken,
    state: Arc<watch::Sender<SessionState>>,
}

impl<C: WsCodec> ReceiveLoop<C> {
    async fn run(self, stream: WsStream) {
        let (mut write, mut read) = stream.split();

        loop {
            let frame = tokio::select! {
                biased;
                () = self.cancel.cancelled() => {
                    debug!("session cancelled");
                    break;
                }
                frame = read.next() => frame,
            };

            let bytes = match frame {
                Some(Ok(Message::Text(text))) => text.into_bytes(),
                Some(Ok(Message::Binary(data))) => data,
                Some(Ok(Message::Ping(data))) => {
                    if let Err(e) = write.send(Message::Pong(data)).await {
                        warn!(error = %e, "failed to answer transport ping");
                        break;
                    }
                    continue;
                }
                Some(Ok(Message::Pong(_) | Message::Frame(_))) => continue,
                Some(Ok(Message::Close(frame))) => {
                    info!(?frame, "connection closed by remote");
                    break;
                }
                Some(Err(e)) => {
                    warn!(error = %e, "read failed, closing session");
                    break;
                }
                None => {
                    info!("connection ended");
                    break;
                }
            };
            self.stats.record_frame();

            let payload = match FrameDecoder.decode(&bytes) {
                Ok(payload) => payload,
                Err(e) => {
                    self.stats.record_decode_failure();
                    warn!(error = %e, frame_len = bytes.len(), "skipping undecodable frame");
                    continue;
                }
            };

            if self.codec.is_heartbeat(&payload) {
                let reply = self.codec.encode_heartbeat_reply(self.clock.now_ms());
                if let Err(e) = write.send(reply).await {
                    warn!(error = %e, "failed to answer heartbeat");
                    break;
                }
                self.stats.record_heartbeat();
                trace!("heartbeat answered");
                continue;
            }

            match self.codec.decode_message(&payload) {
                Ok(Some(update)) => {
                    if !self.publisher.publish(update) {
                        info!("consumer dropped, closing session");
                        break;
                    }
                }
                Ok(None) => trace!("ignored control frame"),
                Err(e) => {
                    self.stats.record_decode_failure();
                    warn!(error = %e, "skipping undecodable payload");
                }
            }
        }

        let _ = tokio::time::timeout(Duration::from_secs(1), write.close()).await;
        self.state.send_replace(SessionState::Closed);
        debug!(
            frames = self.stats.frames_received(),
            dropped = self.stats.dropped(),
            "session closed"
        );
    }
}

/// Consumer side of a running session.
///
/// Dropping the handle cancels the session and closes its socket.
pub struct StreamHandle<T> {
    receiver: UpdateReceiver<T>,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
    state: watch::Receiver<SessionState>,
    subscription: StreamSubscription,
}

impl<T: Clone> StreamHandle<T> {
    /// Next update; `None` once the session is closed and the buffer drained
    pub async fn recv(&mut self) -> Option<T> {
        self.receiver.recv().await
    }

    pub fn try_recv(&mut self) -> Option<T> {
        self.receiver.try_recv()
    }

    pub fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    pub fn stats(&self) -> &StreamStats {
        self.receiver.stats()
    }

    pub fn subscription(&self) -> &StreamSubscription {
        &self.subscription
    }

    /// Wait until the session reaches `Closed`
    pub async fn closed(&mut self) {
        while *self.state.borrow_and_update() != SessionState::Closed {
            if self.state.changed().await.is_err() {
                break;
            }
        }
    }

    /// Cancel the session and wait for its task to finish
    pub async fn close(mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!(error = %e, "stream task ended abnormally");
            }
        }
    }
}

impl<T> Drop for StreamHandle<T> {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl<T> std::fmt::Debug for StreamHandle<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamHandle")
            .field("subscription", &self.subscription)
            .field("state", &*self.state.borrow())
            .finish_non_exhaustive()
    }
}
