//! Outbox publisher.

use gavel_core::bus::EventBus;
use gavel_core::clock::Clock;
use gavel_core::error::AuctionError;
use gavel_core::region::Region;
use gavel_core::store::Outbox;
use std::sync::Arc;

/// Polls the outbox and moves pending rows onto the local event bus.
///
/// Best-effort and caller-driven: a failed row stays pending and is retried
/// on the next poll; a failure on one row never blocks the rest of the
/// batch. Durability comes from the event-store append that preceded the
/// enqueue, idempotency from the applied-event ledger downstream.
pub struct EventPublisher {
    region: Region,
    outbox: Arc<dyn Outbox>,
    bus: Arc<dyn EventBus>,
    clock: Arc<dyn Clock>,
}

impl EventPublisher {
    /// Create a publisher for one region's outbox and bus.
    #[must_use]
    pub fn new(
        region: Region,
        outbox: Arc<dyn Outbox>,
        bus: Arc<dyn EventBus>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            region,
            outbox,
            bus,
            clock,
        }
    }

    /// Publish up to `batch_size` pending rows; returns how many were
    /// published and marked.
    ///
    /// # Errors
    ///
    /// Returns [`AuctionError::Store`] if the outbox itself fails.
    /// Per-row publish failures are logged and swallowed.
    pub async fn publish_pending(&self, batch_size: usize) -> Result<usize, AuctionError> {
        let rows = self.outbox.dequeue_pending(batch_size).await?;
        let mut published = 0;
        for row in rows {
            let envelope = row.to_envelope(self.region);
            match self.bus.publish(&envelope) {
                Ok(()) => {
                    self.outbox.mark_published(row.id, self.clock.now()).await?;
                    published += 1;
                }
                Err(error) => {
                    tracing::warn!(row = %row.id, %error, "publish failed, row stays pending");
                }
            }
        }
        Ok(published)
    }
}

impl std::fmt::Debug for EventPublisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventPublisher")
            .field("region", &self.region)
            .finish_non_exhaustive()
    }
}
