//! In-memory applied-event ledger.

use chrono::{DateTime, Utc};
use gavel_core::ids::EventId;
use gavel_core::store::{AppliedEventLedger, StoreFuture};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// In-memory [`AppliedEventLedger`].
///
/// One instance belongs to exactly one consuming region; regions never
/// share a ledger.
#[derive(Debug, Default, Clone)]
pub struct MemoryAppliedLedger {
    applied: Arc<RwLock<HashMap<EventId, DateTime<Utc>>>>,
}

impl MemoryAppliedLedger {
    /// Create an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of events recorded as applied.
    pub async fn len(&self) -> usize {
        self.applied.read().await.len()
    }

    /// Whether no event has been applied yet.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl AppliedEventLedger for MemoryAppliedLedger {
    fn is_applied(&self, event_id: EventId) -> StoreFuture<'_, bool> {
        let applied = Arc::clone(&self.applied);
        Box::pin(async move { Ok(applied.read().await.contains_key(&event_id)) })
    }

    fn mark_applied(&self, event_id: EventId, at: DateTime<Utc>) -> StoreFuture<'_, ()> {
        let applied = Arc::clone(&self.applied);
        Box::pin(async move {
            applied.write().await.entry(event_id).or_insert(at);
            Ok(())
        })
    }
}
