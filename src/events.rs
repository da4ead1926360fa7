//! Change notifications fanned out to background listeners.

use tokio::sync::broadcast;

use crate::config::NetworkMode;

const EVENT_BUFFER: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    RouterConfigChanged,
    DirectConfigChanged,
    NetworkModeChanged(NetworkMode),
    UnifiedConfigChanged,
    WebDavConfigChanged,
}

/// Cloneable handle to the broadcast channel. Publishing with no subscribers
/// is not an error.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<AppEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(EVENT_BUFFER);
        Self { sender }
    }

    pub fn publish(&self, event: AppEvent) {
        let receivers = self.sender.send(event.clone()).unwrap_or(0);
        tracing::trace!(?event, receivers, "Published event");
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AppEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
