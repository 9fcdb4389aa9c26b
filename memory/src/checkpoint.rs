//! In-memory reconciliation checkpoint store.

use chrono::{DateTime, Utc};
use gavel_core::ids::{AuctionId, EventId};
use gavel_core::store::{CheckpointStore, ReconciliationCheckpoint, StoreFuture};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// In-memory [`CheckpointStore`].
///
/// `upsert` enforces the monotonicity contract here rather than trusting
/// callers: an upsert carrying `None` for `last_event_id` keeps the
/// previously recorded event reference and only refreshes `last_run_at`.
#[derive(Debug, Default, Clone)]
pub struct MemoryCheckpointStore {
    checkpoints: Arc<RwLock<HashMap<AuctionId, ReconciliationCheckpoint>>>,
}

impl MemoryCheckpointStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl CheckpointStore for MemoryCheckpointStore {
    fn get(&self, auction_id: AuctionId) -> StoreFuture<'_, Option<ReconciliationCheckpoint>> {
        let checkpoints = Arc::clone(&self.checkpoints);
        Box::pin(async move { Ok(checkpoints.read().await.get(&auction_id).cloned()) })
    }

    fn upsert(
        &self,
        auction_id: AuctionId,
        last_event_id: Option<EventId>,
        last_run_at: DateTime<Utc>,
    ) -> StoreFuture<'_, ()> {
        let checkpoints = Arc::clone(&self.checkpoints);
        Box::pin(async move {
            let mut guard = checkpoints.write().await;
            let entry = guard
                .entry(auction_id)
                .or_insert_with(|| ReconciliationCheckpoint {
                    auction_id,
                    last_event_id: None,
                    last_run_at,
                });
            if last_event_id.is_some() {
                entry.last_event_id = last_event_id;
            }
            entry.last_run_at = last_run_at;
            Ok(())
        })
    }
}
