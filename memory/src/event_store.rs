//! In-memory append-only event store.

use chrono::{DateTime, Utc};
use gavel_core::event::EventEnvelope;
use gavel_core::ids::{AuctionId, EventId};
use gavel_core::store::{EventStore, StoreFuture};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct EventLog {
    by_auction: HashMap<AuctionId, Vec<EventEnvelope>>,
    created_at_by_id: HashMap<EventId, DateTime<Utc>>,
}

/// In-memory [`EventStore`].
///
/// Envelopes are held per auction in arrival order; queries sort into the
/// total replay order `(created_at, producer_region, event_id)` on the way
/// out, so arrival order never leaks into reconciliation.
#[derive(Debug, Default, Clone)]
pub struct MemoryEventStore {
    log: Arc<RwLock<EventLog>>,
}

impl MemoryEventStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of envelopes appended, across all auctions.
    pub async fn len(&self) -> usize {
        self.log.read().await.created_at_by_id.len()
    }

    /// Whether no envelope has been appended yet.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl EventStore for MemoryEventStore {
    fn append(&self, envelope: EventEnvelope) -> StoreFuture<'_, ()> {
        let log = Arc::clone(&self.log);
        Box::pin(async move {
            let mut guard = log.write().await;
            guard
                .created_at_by_id
                .insert(envelope.event_id, envelope.created_at);
            guard
                .by_auction
                .entry(envelope.auction_id)
                .or_default()
                .push(envelope);
            Ok(())
        })
    }

    fn query_since(
        &self,
        auction_id: AuctionId,
        since: Option<DateTime<Utc>>,
    ) -> StoreFuture<'_, Vec<EventEnvelope>> {
        let log = Arc::clone(&self.log);
        Box::pin(async move {
            let guard = log.read().await;
            let mut events: Vec<EventEnvelope> = guard
                .by_auction
                .get(&auction_id)
                .map(|rows| {
                    rows.iter()
                        .filter(|e| since.is_none_or(|cursor| e.created_at > cursor))
                        .cloned()
                        .collect()
                })
                .unwrap_or_default();
            events.sort_by_key(EventEnvelope::replay_key);
            Ok(events)
        })
    }

    fn resolve_created_at(
        &self,
        event_id: Option<EventId>,
    ) -> StoreFuture<'_, Option<DateTime<Utc>>> {
        let log = Arc::clone(&self.log);
        Box::pin(async move {
            let Some(id) = event_id else {
                return Ok(None);
            };
            Ok(log.read().await.created_at_by_id.get(&id).copied())
        })
    }
}
