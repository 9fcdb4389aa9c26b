//! Deterministic winner resolution.
//!
//! Reconciliation must converge to the same winner in every region, from
//! any permutation of the same bid set, so the comparison is a total order:
//! amount descending, then creation time ascending, then bids from the
//! auction's owner region ahead of others, then bid id ascending. Bid ids
//! are unique, making the final tie-break decisive.

use crate::auction::{Auction, Bid};
use crate::ids::BidId;
use crate::region::Region;
use std::cmp::Ordering;

/// Total order used by winner selection.
///
/// The owner-region preference is the cross-region tie-break: when two
/// regions disagree on "who won" with equal amounts and timestamps, the
/// auction's creator region wins the tie.
#[must_use]
pub fn winner_ordering(owner_region: Region, a: &Bid, b: &Bid) -> Ordering {
    let owner_rank = |bid: &Bid| u8::from(bid.source_region != owner_region);
    b.amount
        .cmp(&a.amount)
        .then_with(|| a.created_at.cmp(&b.created_at))
        .then_with(|| owner_rank(a).cmp(&owner_rank(b)))
        .then_with(|| a.id.cmp(&b.id))
}

/// Total order used by leaderboard reads.
///
/// Same shape as [`winner_ordering`] but with a plain ascending region
/// tie-break, so every caller observes one consistent leaderboard.
#[must_use]
pub fn leaderboard_ordering(a: &Bid, b: &Bid) -> Ordering {
    b.amount
        .cmp(&a.amount)
        .then_with(|| a.created_at.cmp(&b.created_at))
        .then_with(|| a.source_region.cmp(&b.source_region))
        .then_with(|| a.id.cmp(&b.id))
}

/// Compute the deterministic winner of an auction over its full bid set.
///
/// Pure and side-effect free: recomputable any number of times from the
/// same inputs with the same result. Returns `None` when no bids exist.
#[must_use]
pub fn decide_winner(auction: &Auction, all_bids: &[Bid]) -> Option<BidId> {
    all_bids
        .iter()
        .min_by(|a, b| winner_ordering(auction.owner_region, a, b))
        .map(|bid| bid.id)
}
