//! # Message Bus
//!
//! A broadcast channel of raw JSON strings modeling one direction of the
//! untrusted relay between the page-embedded client and the privileged
//! context. Two buses make up a full link: requests flow one way,
//! responses the other.
//!
//! The relay gives no delivery or ordering guarantees to any particular
//! party, so everything riding it is treated as untrusted text until it
//! parses into an envelope.

use tokio::sync::broadcast;

/// Default channel capacity
///
/// Slow subscribers past this depth see `Lagged` and skip; correlation
/// handles that by continuing to the next message.
pub const DEFAULT_CAPACITY: usize = 64;

/// One direction of the relay
#[derive(Clone)]
pub struct MessageBus {
    tx: broadcast::Sender<String>,
}

impl MessageBus {
    /// Create a bus with the given buffer capacity
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Publish a raw message
    ///
    /// Publishing with zero subscribers is not an error; the relay drops
    /// messages nobody is listening for.
    pub fn publish(&self, raw: String) {
        let _ = self.tx.send(raw);
    }

    /// Subscribe to all messages published after this call
    pub fn subscribe(&self) -> broadcast::Receiver<String> {
        self.tx.subscribe()
    }
}

impl Default for MessageBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ============================================================================
// TESTS
// ============================================================================
