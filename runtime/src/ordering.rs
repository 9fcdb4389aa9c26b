//! Per-auction bid sequencing and ordering.

use chrono::{DateTime, Utc};
use gavel_core::auction::Bid;
use gavel_core::error::AuctionError;
use gavel_core::ids::{AuctionId, Sequence};
use gavel_core::resolver::leaderboard_ordering;
use gavel_core::store::BidStore;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Classification of an incoming bid's sequence number against the last
/// sequence seen for its auction.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BidOrder {
    /// The sequence is exactly the next expected value.
    Accepted,
    /// The sequence was already seen (at or below the last value).
    Duplicate,
    /// The sequence skips ahead of the next expected value.
    OutOfOrder,
    /// The sequence can never be assigned (zero).
    Invalid,
}

/// Per-region sequencer.
///
/// Keeps one counter per auction id; because every region runs its own
/// instance, the counter is effectively scoped to (auction, region) — the
/// same scope as the bid idempotency key. The counter lives behind an async
/// mutex so concurrent callers for the same auction never observe two equal
/// "next sequence" results.
pub struct BidOrderingService {
    bids: Arc<dyn BidStore>,
    last_seen: Mutex<HashMap<AuctionId, Sequence>>,
}

impl BidOrderingService {
    /// Create a sequencer over the given bid store.
    #[must_use]
    pub fn new(bids: Arc<dyn BidStore>) -> Self {
        Self {
            bids,
            last_seen: Mutex::new(HashMap::new()),
        }
    }

    /// Next sequence for an auction: strictly increasing, starting at 1,
    /// never repeated for the same auction id.
    pub async fn get_next_bid_sequence(&self, auction_id: AuctionId) -> Sequence {
        let mut guard = self.last_seen.lock().await;
        let entry = guard.entry(auction_id).or_insert(Sequence::new(0));
        *entry = entry.next();
        *entry
    }

    /// Classify a bid's sequence against this auction's last-seen value.
    ///
    /// With no prior sequence known, only sequence 1 is accepted. An
    /// accepted sequence becomes the new last-seen value.
    pub async fn validate_bid_order(&self, auction_id: AuctionId, bid: &Bid) -> BidOrder {
        if !bid.sequence.is_valid() {
            return BidOrder::Invalid;
        }
        let mut guard = self.last_seen.lock().await;
        match guard.get(&auction_id).copied() {
            None if bid.sequence == Sequence::FIRST => {
                guard.insert(auction_id, bid.sequence);
                BidOrder::Accepted
            }
            None => BidOrder::OutOfOrder,
            Some(last) if bid.sequence == last.next() => {
                guard.insert(auction_id, bid.sequence);
                BidOrder::Accepted
            }
            Some(last) if bid.sequence <= last => BidOrder::Duplicate,
            Some(_) => BidOrder::OutOfOrder,
        }
    }

    /// Bids for an auction, optionally filtered to those created at or
    /// after `since`, in leaderboard order (the reconciliation tie-break
    /// order with a plain ascending region tie-break).
    ///
    /// # Errors
    ///
    /// Returns [`AuctionError::Store`] if the bid store fails.
    pub async fn get_ordered_bids(
        &self,
        auction_id: AuctionId,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<Bid>, AuctionError> {
        let mut bids = self.bids.all_for_auction(auction_id).await?;
        if let Some(cutoff) = since {
            bids.retain(|b| b.created_at >= cutoff);
        }
        bids.sort_by(leaderboard_ordering);
        Ok(bids)
    }
}

impl std::fmt::Debug for BidOrderingService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BidOrderingService").finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)] // Panics: tests fail loudly on store errors
mod tests {
    use super::*;
    use chrono::Duration;
    use gavel_core::ids::BidId;
    use gavel_core::region::Region;
    use gavel_memory::MemoryBidStore;
    use rust_decimal::Decimal;

    fn service() -> BidOrderingService {
        BidOrderingService::new(Arc::new(MemoryBidStore::new()))
    }

    fn bid_with(auction_id: AuctionId, sequence: u64, amount: i64, offset_ms: i64) -> Bid {
        let t = Utc::now() + Duration::milliseconds(offset_ms);
        Bid {
            id: BidId::new(),
            auction_id,
            amount: Decimal::from(amount),
            sequence: Sequence::new(sequence),
            source_region: Region::Us,
            created_at: t,
            partition_flag: false,
            bidder: None,
            updated_at: t,
            deleted_at: None,
        }
    }

    #[tokio::test]
    async fn sequences_increase_strictly_from_one_per_auction() {
        let svc = service();
        let a = AuctionId::new();
        let b = AuctionId::new();

        assert_eq!(svc.get_next_bid_sequence(a).await, Sequence::new(1));
        assert_eq!(svc.get_next_bid_sequence(a).await, Sequence::new(2));
        assert_eq!(svc.get_next_bid_sequence(b).await, Sequence::new(1));
        assert_eq!(svc.get_next_bid_sequence(a).await, Sequence::new(3));
    }

    #[tokio::test]
    async fn concurrent_callers_never_share_a_sequence() {
        let svc = Arc::new(service());
        let auction_id = AuctionId::new();

        let mut handles = Vec::new();
        for _ in 0..16 {
            let svc = Arc::clone(&svc);
            handles.push(tokio::spawn(async move {
                svc.get_next_bid_sequence(auction_id).await
            }));
        }
        let mut seen = Vec::new();
        for handle in handles {
            seen.push(handle.await.expect("task").value());
        }
        seen.sort_unstable();
        assert_eq!(seen, (1..=16).collect::<Vec<u64>>());
    }

    #[tokio::test]
    async fn validation_classifies_all_four_ways() {
        let svc = service();
        let auction_id = AuctionId::new();

        assert_eq!(
            svc.validate_bid_order(auction_id, &bid_with(auction_id, 0, 100, 0))
                .await,
            BidOrder::Invalid
        );
        assert_eq!(
            svc.validate_bid_order(auction_id, &bid_with(auction_id, 2, 100, 0))
                .await,
            BidOrder::OutOfOrder
        );
        assert_eq!(
            svc.validate_bid_order(auction_id, &bid_with(auction_id, 1, 100, 0))
                .await,
            BidOrder::Accepted
        );
        assert_eq!(
            svc.validate_bid_order(auction_id, &bid_with(auction_id, 1, 100, 0))
                .await,
            BidOrder::Duplicate
        );
        assert_eq!(
            svc.validate_bid_order(auction_id, &bid_with(auction_id, 3, 100, 0))
                .await,
            BidOrder::OutOfOrder
        );
        assert_eq!(
            svc.validate_bid_order(auction_id, &bid_with(auction_id, 2, 100, 0))
                .await,
            BidOrder::Accepted
        );
    }

    #[tokio::test]
    async fn ordered_bids_apply_since_filter_and_leaderboard_order() {
        let store = Arc::new(MemoryBidStore::new());
        let svc = BidOrderingService::new(Arc::clone(&store) as Arc<dyn BidStore>);
        let auction_id = AuctionId::new();

        let old_low = bid_with(auction_id, 1, 100, -10_000);
        let high = bid_with(auction_id, 2, 300, 0);
        let low = bid_with(auction_id, 3, 200, 5);
        for b in [old_low.clone(), low.clone(), high.clone()] {
            store.insert(b).await.expect("insert");
        }

        let all = svc.get_ordered_bids(auction_id, None).await.expect("list");
        assert_eq!(all, vec![high.clone(), low.clone(), old_low]);

        let recent = svc
            .get_ordered_bids(auction_id, Some(high.created_at))
            .await
            .expect("list");
        assert_eq!(recent, vec![high, low]);
    }
}
