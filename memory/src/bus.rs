//! Synchronous in-process event bus.

use gavel_core::bus::{EventBus, EventBusError, EventHandler, Subscription};
use gavel_core::event::EventEnvelope;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Synchronous in-process [`EventBus`].
///
/// Handlers run on the publisher's call stack, one after another. The
/// subscriber list is snapshotted before dispatch so handlers never run
/// while the registry lock is held; a handler may therefore publish or
/// subscribe reentrantly without deadlocking.
#[derive(Default, Clone)]
pub struct MemoryEventBus {
    handlers: Arc<Mutex<Vec<(u64, EventHandler)>>>,
    next_id: Arc<AtomicU64>,
}

impl MemoryEventBus {
    /// Create a bus with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live subscriptions.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.handlers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl std::fmt::Debug for MemoryEventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryEventBus")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

impl EventBus for MemoryEventBus {
    fn publish(&self, envelope: &EventEnvelope) -> Result<(), EventBusError> {
        let snapshot: Vec<EventHandler> = self
            .handlers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, h)| Arc::clone(h))
            .collect();
        for handler in snapshot {
            handler(envelope);
        }
        Ok(())
    }

    fn subscribe(&self, handler: EventHandler) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.handlers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, handler));

        let handlers = Arc::clone(&self.handlers);
        Subscription::new(move || {
            handlers
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .retain(|(hid, _)| *hid != id);
        })
    }
}
