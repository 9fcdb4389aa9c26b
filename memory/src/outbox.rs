//! In-memory transactional outbox.

use chrono::{DateTime, Utc};
use gavel_core::ids::OutboxId;
use gavel_core::store::{Outbox, OutboxRow, StoreFuture};
use std::sync::Arc;
use tokio::sync::RwLock;

/// In-memory [`Outbox`].
///
/// Rows stay in the table forever; `dequeue_pending` only filters on the
/// published flag. Pending rows are returned oldest-first with the event id
/// as a deterministic tie-break for equal timestamps.
#[derive(Debug, Default, Clone)]
pub struct MemoryOutbox {
    rows: Arc<RwLock<Vec<OutboxRow>>>,
}

impl MemoryOutbox {
    /// Create an empty outbox.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rows still awaiting publication.
    pub async fn pending_count(&self) -> usize {
        self.rows.read().await.iter().filter(|r| !r.published).count()
    }
}

impl Outbox for MemoryOutbox {
    fn enqueue(&self, row: OutboxRow) -> StoreFuture<'_, ()> {
        let rows = Arc::clone(&self.rows);
        Box::pin(async move {
            rows.write().await.push(row);
            Ok(())
        })
    }

    fn dequeue_pending(&self, batch_size: usize) -> StoreFuture<'_, Vec<OutboxRow>> {
        let rows = Arc::clone(&self.rows);
        Box::pin(async move {
            let guard = rows.read().await;
            let mut pending: Vec<OutboxRow> =
                guard.iter().filter(|r| !r.published).cloned().collect();
            pending.sort_by_key(|r| (r.created_at, r.event_id));
            pending.truncate(batch_size);
            Ok(pending)
        })
    }

    fn mark_published(&self, id: OutboxId, at: DateTime<Utc>) -> StoreFuture<'_, ()> {
        let rows = Arc::clone(&self.rows);
        Box::pin(async move {
            if let Some(row) = rows.write().await.iter_mut().find(|r| r.id == id) {
                row.published = true;
                row.published_at = Some(at);
            }
            Ok(())
        })
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)] // Panics: tests fail loudly on store errors
mod tests {
    use super::*;
    use chrono::Duration;
    use gavel_core::event::EventEnvelope;
    use gavel_core::ids::{AuctionId, EventId};
    use gavel_core::region::Region;

    fn row(created_at: DateTime<Utc>) -> OutboxRow {
        let envelope = EventEnvelope {
            event_id: EventId::new(),
            producer_region: Region::Us,
            event_type: "AuctionActivated".to_owned(),
            auction_id: AuctionId::new(),
            payload: serde_json::json!({}),
            created_at,
        };
        OutboxRow::pending(&envelope, "Auction")
    }

    #[tokio::test]
    async fn dequeue_returns_oldest_first_and_caps_batch() {
        let outbox = MemoryOutbox::new();
        let base = Utc::now();
        let newest = row(base + Duration::seconds(2));
        let middle = row(base + Duration::seconds(1));
        let oldest = row(base);
        for r in [newest.clone(), middle.clone(), oldest.clone()] {
            outbox.enqueue(r).await.expect("enqueue");
        }

        let batch = outbox.dequeue_pending(2).await.expect("dequeue");
        assert_eq!(batch, vec![oldest, middle]);
    }

    #[tokio::test]
    async fn published_rows_leave_the_pending_set_but_not_the_table() {
        let outbox = MemoryOutbox::new();
        let r = row(Utc::now());
        let id = r.id;
        outbox.enqueue(r).await.expect("enqueue");

        let at = Utc::now();
        outbox.mark_published(id, at).await.expect("mark");

        assert!(outbox.dequeue_pending(10).await.expect("dequeue").is_empty());
        assert_eq!(outbox.pending_count().await, 0);
        let table = outbox.rows.read().await;
        assert_eq!(table.len(), 1);
        assert_eq!(table[0].published_at, Some(at));
    }

    #[tokio::test]
    async fn redelivery_window_rows_stay_pending_until_marked() {
        let outbox = MemoryOutbox::new();
        outbox.enqueue(row(Utc::now())).await.expect("enqueue");

        let first = outbox.dequeue_pending(10).await.expect("dequeue");
        let second = outbox.dequeue_pending(10).await.expect("dequeue");
        assert_eq!(first, second);
    }
}
