//! Broadcast bus for player events.
//!
//! Decode commands and status changes fan out to every connected SSE
//! client. Send failures mean no subscribers are listening and are ignored.

use playback_session::DecodeCommand;
use tokio::sync::broadcast;

/// Events pushed to player event stream subscribers.
#[derive(Clone, Debug)]
pub enum PlayerBusEvent {
    /// A decode command the connected player element must execute.
    Command(DecodeCommand),
    /// Session status changed; subscribers should refetch or re-render.
    StatusChanged,
    /// A playback error worth surfacing to listeners.
    Error(String),
}

/// Cloneable handle to the player event bus.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<PlayerBusEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(64);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PlayerBusEvent> {
        self.sender.subscribe()
    }

    pub fn command(&self, cmd: DecodeCommand) {
        let _ = self.sender.send(PlayerBusEvent::Command(cmd));
    }

    pub fn status_changed(&self) {
        let _ = self.sender.send(PlayerBusEvent::StatusChanged);
    }

    pub fn error(&self, message: String) {
        let _ = self.sender.send(PlayerBusEvent::Error(message));
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
