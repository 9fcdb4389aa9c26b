//! Local event bus abstraction.
//!
//! Each region runs one local bus. The outbox publisher pushes envelopes
//! onto it; the database sync service holds a standing subscription that
//! forwards everything into the inter-region link. Delivery on the bus is
//! at-least-once in the wider system's terms: durability comes from the
//! event store append that precedes publication, and idempotency from the
//! applied-event ledger downstream, so bus subscribers must tolerate
//! duplicates.

use crate::event::EventEnvelope;
use std::sync::Arc;
use thiserror::Error;

/// Errors that can occur during event bus operations.
#[derive(Error, Debug, Clone)]
pub enum EventBusError {
    /// Failed to publish an envelope.
    #[error("Publish failed: {0}")]
    PublishFailed(String),
}

/// Callback invoked for every envelope published on the bus.
pub type EventHandler = Arc<dyn Fn(&EventEnvelope) + Send + Sync>;

/// Unsubscribe handle returned by [`EventBus::subscribe`].
///
/// Dropping the handle (or calling [`unsubscribe`]) removes the handler
/// from the bus; holding it keeps the subscription alive.
///
/// [`unsubscribe`]: Subscription::unsubscribe
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    /// Wrap a cancellation closure.
    #[must_use]
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Explicitly remove the handler from the bus.
    pub fn unsubscribe(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

/// Trait for local event bus implementations.
///
/// Implementations must be `Send + Sync`; `publish` may be called from many
/// producers concurrently. Handlers run synchronously on the publisher's
/// call stack, so they must be short and must not block.
pub trait EventBus: Send + Sync {
    /// Deliver an envelope to every current subscriber.
    ///
    /// # Errors
    ///
    /// Returns [`EventBusError::PublishFailed`] if the bus itself fails;
    /// individual handler panics or failures are not surfaced here.
    fn publish(&self, envelope: &EventEnvelope) -> Result<(), EventBusError>;

    /// Register a handler for all subsequently published envelopes.
    ///
    /// The returned [`Subscription`] unsubscribes on drop.
    fn subscribe(&self, handler: EventHandler) -> Subscription;
}
