use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tracing::debug;

/// Counters shared between a streaming session and its consumer
#[derive(Debug, Default)]
pub struct StreamStats {
    frames_received: AtomicU64,
    heartbeats_answered: AtomicU64,
    decode_failures: AtomicU64,
    updates_published: AtomicU64,
    dropped: AtomicU64,
}

impl StreamStats {
    pub fn frames_received(&self) -> u64 {
        self.frames_received.load(Ordering::Relaxed)
    }

    pub fn heartbeats_answered(&self) -> u64 {
        self.heartbeats_answered.load(Ordering::Relaxed)
    }

    pub fn decode_failures(&self) -> u64 {
        self.decode_failures.load(Ordering::Relaxed)
    }

    pub fn updates_published(&self) -> u64 {
        self.updates_published.load(Ordering::Relaxed)
    }

    /// Updates overwritten because the consumer fell behind
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    pub(crate) fn record_frame(&self) {
        self.frames_received.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_heartbeat(&self) {
        self.heartbeats_answered.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_decode_failure(&self) {
        self.decode_failures.fetch_add(1, Ordering::Relaxed);
    }
}

/// Bounded, drop-oldest channel between the receive loop and the consumer.
///
/// Publishing never waits. When `capacity` updates are already queued the
/// oldest one is overwritten and [`StreamStats::dropped`] is incremented.
/// The effective capacity is rounded up to a power of two.
pub fn update_channel<T: Clone>(
    capacity: usize,
    stats: Arc<StreamStats>,
) -> (UpdatePublisher<T>, UpdateReceiver<T>) {
    let capacity = capacity.max(1).next_power_of_two();
    let (tx, rx) = broadcast::channel(capacity);
    (
        UpdatePublisher {
            tx,
            capacity,
            stats: stats.clone(),
        },
        UpdateReceiver { rx, stats },
    )
}

#[derive(Debug)]
pub struct UpdatePublisher<T> {
    tx: broadcast::Sender<T>,
    capacity: usize,
    stats: Arc<StreamStats>,
}

impl<T: Clone> UpdatePublisher<T> {
    /// Queue an update. Returns `false` once the consumer is gone.
    pub fn publish(&self, update: T) -> bool {
        if self.tx.len() >= self.capacity {
            self.stats.dropped.fetch_add(1, Ordering::Relaxed);
        }
        if self.tx.send(update).is_err() {
            return false;
        }
        self.stats.updates_published.fetch_add(1, Ordering::Relaxed);
        true
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_closed(&self) -> bool {
        self.tx.receiver_count() == 0
    }
}

#[derive(Debug)]
pub struct UpdateReceiver<T> {
    rx: broadcast::Receiver<T>,
    stats: Arc<StreamStats>,
}

impl<T: Clone> UpdateReceiver<T> {
    /// Next update, or `None` once the session has closed and the queue is drained
    pub async fn recv(&mut self) -> Option<T> {
        loop {
            match self.rx.recv().await {
                Ok(update) => return Some(update),
                Err(RecvError::Lagged(skipped)) => {
                    debug!(skipped, "consumer lagged behind stream");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Non-blocking variant of [`recv`](Self::recv); `None` when nothing is queued
    pub fn try_recv(&mut self) -> Option<T> {
        loop {
            match self.rx.try_recv() {
                Ok(update) => return Some(update),
                Err(TryRecvError::Lagged(_)) => {}
                Err(TryRecvError::Empty | TryRecvError::Closed) => return None,
            }
        }
    }

    pub fn stats(&self) -> &StreamStats {
        &self.stats
    }
}
