//! # Message Fan-Out
//!
//! Carries a copy of every newly stored message to live WebSocket viewers.
//!
//! ## Failure Isolation:
//! Publishing is fire-and-forget: a send with no subscribers, a lagging
//! subscriber, or a closed channel must never fail the voice turn that
//! produced the message. The broadcast channel drops the oldest events for
//! slow receivers rather than applying backpressure to the pipeline.

use crate::conversation::Message;
use tokio::sync::broadcast;

/// Buffered events per subscriber before the oldest are dropped.
const CHANNEL_CAPACITY: usize = 64;

/// Broadcast handle shared by the pipeline (publisher) and WebSocket
/// sessions (subscribers). Cloning is cheap; all clones feed the same
/// channel.
#[derive(Clone)]
pub struct MessageBroadcaster {
    sender: broadcast::Sender<Message>,
}

impl MessageBroadcaster {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    /// Publish a stored message to all connected viewers.
    ///
    /// A send error only means nobody is listening right now; that is a
    /// normal state, not a fault.
    pub fn publish(&self, message: &Message) {
        if self.sender.send(message.clone()).is_err() {
            tracing::trace!("no live viewers connected, message fan-out skipped");
        }
    }

    /// Open a subscription that receives every message published after this
    /// call.
    pub fn subscribe(&self) -> broadcast::Receiver<Message> {
        self.sender.subscribe()
    }

    /// Number of currently connected viewers.
    pub fn viewer_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for MessageBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}
