//! Fan-out of text frames to every connected WebSocket client
//!
//! Each connection task holds its own receiver, so a slow client lags on its
//! own queue instead of blocking the sender.

use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::broadcast;

use super::events::WsFrame;
use crate::error::BroadcastError;
use crate::sequencer::Broadcast;

/// Frames buffered per receiver before a slow client starts lagging
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1024;

/// Broadcast channel plus a sequence counter
pub struct FrameBroadcaster {
    tx: broadcast::Sender<WsFrame>,
    sequence_counter: AtomicU64,
}

impl FrameBroadcaster {
    /// Create a new broadcaster with the given capacity
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self {
            tx,
            sequence_counter: AtomicU64::new(0),
        }
    }

    /// Send a text frame to all connected clients
    pub fn send_text(&self, text: &str) -> Result<usize, BroadcastError> {
        let seq = self.sequence_counter.fetch_add(1, Ordering::SeqCst);
        let frame = WsFrame::new(seq, text);
        // Err only means nobody is subscribed right now
        self.tx.send(frame).map_err(|_| BroadcastError::NoClients)
    }

    /// Sequence id the next frame will get
    pub fn current_sequence_id(&self) -> u64 {
        self.sequence_counter.load(Ordering::SeqCst)
    }

    /// Subscribe to receive broadcast frames
    pub fn subscribe(&self) -> broadcast::Receiver<WsFrame> {
        self.tx.subscribe()
    }
}

impl Default for FrameBroadcaster {
    fn default() -> Self {
        Self::new(DEFAULT_CHANNEL_CAPACITY)
    }
}

impl Broadcast for FrameBroadcaster {
    fn broadcast(&self, payload: &str) -> Result<usize, BroadcastError> {
        self.send_text(payload)
    }
}
