//! Event-driven communication between the tick loop and other services.

use anyhow::Result;
use tokio::sync::broadcast;

use crate::dispatcher::FaderReport;

/// Application events.
#[derive(Debug, Clone)]
pub enum Event {
    /// A fader sampled its sensors.
    FaderEvaluated(FaderReport),
    SystemShutdown,
}

/// Publish-subscribe channel shared by all services.
///
/// # Example
///
/// ```no_run
/// use tempfaderd::event::{Event, EventBus};
///
/// let event_bus = EventBus::new();
/// let mut subscriber = event_bus.subscribe();
/// event_bus.publish(Event::SystemShutdown).unwrap();
/// // In async context: let event = subscriber.recv().await;
/// ```
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<Event>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_capacity(100)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns an error if there are no active subscribers.
    pub fn publish(&self, event: Event) -> Result<()> {
        self.sender.send(event)?;
        Ok(())
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
