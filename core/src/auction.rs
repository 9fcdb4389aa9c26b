//! The auction aggregate.
//!
//! Mutable aggregate fields (state, high bid, sequence counter) only change
//! through the version-guarded conditional write on the auction store; the
//! `row_version` counter increments exactly once per successful mutation and
//! is the optimistic-concurrency guard for the bid write path.

use crate::ids::{AuctionId, BidId, Sequence};
use crate::region::Region;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of an auction.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuctionState {
    /// Created but not yet accepting bids.
    Draft,
    /// Accepting bids.
    Active,
    /// In its closing window, still accepting bids.
    Ending,
    /// Closed; no further bids.
    Ended,
    /// Cancelled before completion.
    Cancelled,
}

impl AuctionState {
    /// Whether an auction in this state accepts new bids.
    #[must_use]
    pub const fn accepts_bids(self) -> bool {
        matches!(self, Self::Active | Self::Ending)
    }

    /// Whether the lifecycle has finished (terminal states).
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Ended | Self::Cancelled)
    }
}

impl fmt::Display for AuctionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Draft => "Draft",
            Self::Active => "Active",
            Self::Ending => "Ending",
            Self::Ended => "Ended",
            Self::Cancelled => "Cancelled",
        };
        f.write_str(s)
    }
}

/// A single logical auction, owned by one region but mirrored into others.
///
/// Invariants:
///
/// - `current_seq` only ever increases.
/// - `row_version` increments exactly once per successful mutation.
/// - `winner_bid_id`, once set by reconciliation, references a bid that
///   exists in this auction's bid set.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Auction {
    /// Auction identity.
    pub id: AuctionId,
    /// The region that created (and reconciles) this auction.
    pub owner_region: Region,
    /// Lifecycle state.
    pub state: AuctionState,
    /// When the auction stops accepting bids.
    pub ends_at: DateTime<Utc>,
    /// Highest accepted bid amount, if any bid has been accepted.
    pub current_high_bid: Option<Decimal>,
    /// Highest sequence recorded on the aggregate so far.
    pub current_seq: u64,
    /// Optimistic-concurrency version counter.
    pub row_version: u64,
    /// Winning bid chosen by reconciliation, if it has run.
    pub winner_bid_id: Option<BidId>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last-update timestamp.
    pub updated_at: DateTime<Utc>,
    /// Soft-delete timestamp.
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Auction {
    /// Create a fresh auction in `Draft` state with zeroed counters.
    #[must_use]
    pub fn draft(
        id: AuctionId,
        owner_region: Region,
        ends_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            owner_region,
            state: AuctionState::Draft,
            ends_at,
            current_high_bid: None,
            current_seq: 0,
            row_version: 0,
            winner_bid_id: None,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }
}

/// A recorded bid attempt.
///
/// The triple `(auction_id, source_region, sequence)` is unique; it is the
/// idempotency key that suppresses duplicates when events are redelivered
/// across regions. A bid row is retained even when the aggregate update that
/// followed it lost an optimistic-concurrency race, so reconciliation sees
/// every attempt.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bid {
    /// Bid identity.
    pub id: BidId,
    /// The auction this bid belongs to.
    pub auction_id: AuctionId,
    /// Monetary amount.
    pub amount: Decimal,
    /// Per-(auction, source-region) sequence number.
    pub sequence: Sequence,
    /// The region where the bid was placed.
    pub source_region: Region,
    /// When the bid was placed.
    pub created_at: DateTime<Utc>,
    /// True when the bid was placed while the inter-region link was
    /// partitioned.
    pub partition_flag: bool,
    /// Optional bidder reference.
    pub bidder: Option<String>,
    /// Last-update timestamp.
    pub updated_at: DateTime<Utc>,
    /// Soft-delete timestamp.
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Bid {
    /// The duplicate-suppression key for this bid.
    #[must_use]
    pub const fn idempotency_key(&self) -> (AuctionId, Region, Sequence) {
        (self.auction_id, self.source_region, self.sequence)
    }
}
