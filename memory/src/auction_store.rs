//! In-memory auction aggregate store with optimistic concurrency.

use chrono::Utc;
use gavel_core::auction::Auction;
use gavel_core::ids::{AuctionId, BidId, Sequence};
use gavel_core::store::{AuctionStore, StoreFuture};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// In-memory [`AuctionStore`].
///
/// The compare-and-swap in [`AuctionStore::try_update_amounts`] performs
/// the version check and the bump under one write lock, so of two
/// concurrent updates with the same expected version exactly one succeeds
/// and the row version advances exactly once.
#[derive(Debug, Default, Clone)]
pub struct MemoryAuctionStore {
    auctions: Arc<RwLock<HashMap<AuctionId, Auction>>>,
}

impl MemoryAuctionStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl AuctionStore for MemoryAuctionStore {
    fn get(&self, id: AuctionId) -> StoreFuture<'_, Option<Auction>> {
        let auctions = Arc::clone(&self.auctions);
        Box::pin(async move { Ok(auctions.read().await.get(&id).cloned()) })
    }

    fn upsert(&self, auction: Auction) -> StoreFuture<'_, ()> {
        let auctions = Arc::clone(&self.auctions);
        Box::pin(async move {
            auctions.write().await.insert(auction.id, auction);
            Ok(())
        })
    }

    fn try_update_amounts(
        &self,
        id: AuctionId,
        new_high: Decimal,
        new_seq: Sequence,
        expected_version: u64,
    ) -> StoreFuture<'_, bool> {
        let auctions = Arc::clone(&self.auctions);
        Box::pin(async move {
            let mut guard = auctions.write().await;
            let Some(auction) = guard.get_mut(&id) else {
                return Ok(false);
            };
            if auction.row_version != expected_version {
                return Ok(false);
            }
            auction.current_high_bid = Some(new_high);
            auction.current_seq = new_seq.value();
            auction.row_version += 1;
            auction.updated_at = Utc::now();
            Ok(true)
        })
    }

    fn save_winner(&self, id: AuctionId, winner: Option<BidId>) -> StoreFuture<'_, ()> {
        let auctions = Arc::clone(&self.auctions);
        Box::pin(async move {
            if let Some(auction) = auctions.write().await.get_mut(&id) {
                auction.winner_bid_id = winner;
                auction.updated_at = Utc::now();
            }
            Ok(())
        })
    }
}
