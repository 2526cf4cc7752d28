//! # Change notifications
//!
//! The services announce every successful mutation on an [`EventBus`]. Events carry
//! no payload: a subscriber that sees [`ChangeEvent::Project`] re-lists projects,
//! one that sees [`ChangeEvent::Auth`] re-reads the current user.
//!
//! A [`Subscription`] is the lifetime of one listener. Dropping it (or calling
//! [`Subscription::unsubscribe`]) detaches the listener; publishing with no
//! listeners attached is not an error.

use tokio::sync::broadcast;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};

const DEFAULT_CAPACITY: usize = 64;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChangeEvent {
    Project,
    Message,
    Auth,
}

impl ChangeEvent {
    /// Wire name of the event, as seen by the presentation layer.
    pub fn name(&self) -> &'static str {
        match self {
            ChangeEvent::Project => "project-change",
            ChangeEvent::Message => "message-change",
            ChangeEvent::Auth => "auth-change",
        }
    }
}

impl std::fmt::Display for ChangeEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Clone, Debug)]
pub struct EventBus {
    sender: broadcast::Sender<ChangeEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Fire-and-forget publish.
    pub fn publish(&self, event: ChangeEvent) {
        let listeners = self.sender.send(event).unwrap_or(0);
        tracing::trace!(event = event.name(), listeners, "published change event");
    }

    pub fn subscribe(&self) -> Subscription {
        Subscription {
            receiver: self.sender.subscribe(),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

#[derive(Debug)]
pub struct Subscription {
    receiver: broadcast::Receiver<ChangeEvent>,
}

impl Subscription {
    /// Wait for the next event. Returns `None` once the bus is gone.
    ///
    /// A listener that falls behind skips the events it missed; since events carry
    /// no payload, the next one is enough to trigger a refresh.
    pub async fn recv(&mut self) -> Option<ChangeEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "change listener lagged");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// The next already-published event, if any.
    pub fn try_recv(&mut self) -> Option<ChangeEvent> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => return Some(event),
                Err(TryRecvError::Lagged(_)) => continue,
                Err(TryRecvError::Empty | TryRecvError::Closed) => return None,
            }
        }
    }

    /// Drain everything published so far.
    pub fn drain(&mut self) -> Vec<ChangeEvent> {
        std::iter::from_fn(|| self.try_recv()).collect()
    }

    pub fn unsubscribe(self) {}
}
