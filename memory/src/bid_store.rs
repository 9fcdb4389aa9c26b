//! In-memory bid store keyed by auction.

use gavel_core::auction::Bid;
use gavel_core::ids::{AuctionId, Sequence};
use gavel_core::region::Region;
use gavel_core::store::{BidStore, StoreFuture};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// In-memory [`BidStore`].
///
/// Rows are grouped per auction; `exists` scans the auction's rows for the
/// (source-region, sequence) idempotency key.
#[derive(Debug, Default, Clone)]
pub struct MemoryBidStore {
    bids: Arc<RwLock<HashMap<AuctionId, Vec<Bid>>>>,
}

impl MemoryBidStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl BidStore for MemoryBidStore {
    fn insert(&self, bid: Bid) -> StoreFuture<'_, ()> {
        let bids = Arc::clone(&self.bids);
        Box::pin(async move {
            bids.write().await.entry(bid.auction_id).or_default().push(bid);
            Ok(())
        })
    }

    fn exists(
        &self,
        auction_id: AuctionId,
        source_region: Region,
        sequence: Sequence,
    ) -> StoreFuture<'_, bool> {
        let bids = Arc::clone(&self.bids);
        Box::pin(async move {
            let guard = bids.read().await;
            Ok(guard.get(&auction_id).is_some_and(|rows| {
                rows.iter()
                    .any(|b| b.source_region == source_region && b.sequence == sequence)
            }))
        })
    }

    fn all_for_auction(&self, auction_id: AuctionId) -> StoreFuture<'_, Vec<Bid>> {
        let bids = Arc::clone(&self.bids);
        Box::pin(async move {
            Ok(bids
                .read()
                .await
                .get(&auction_id)
                .cloned()
                .unwrap_or_default())
        })
    }
}
