//! Error taxonomy for auction operations.
//!
//! The write path distinguishes validation, not-found, state-conflict,
//! concurrency-conflict, duplicate, and partition errors so callers can
//! react differently: a concurrency conflict is retryable with a fresh
//! read, a duplicate is not, and an unreachable region is an operational
//! condition rather than a data error.

use crate::bus::EventBusError;
use crate::event::EventError;
use crate::ids::{AuctionId, Sequence, VehicleId};
use crate::region::Region;
use crate::store::StoreError;
use thiserror::Error;

/// Errors surfaced by the auction services.
#[derive(Error, Debug)]
pub enum AuctionError {
    /// A caller-supplied identifier could not be parsed.
    #[error("Invalid identifier: {0}")]
    InvalidId(String),

    /// A caller-supplied value failed validation.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// The auction does not exist (distinct from validation).
    #[error("Auction not found: {0}")]
    AuctionNotFound(AuctionId),

    /// The vehicle does not exist.
    #[error("Vehicle not found: {0}")]
    VehicleNotFound(VehicleId),

    /// Auction creation was attempted for a vehicle owned by another region.
    #[error("Auction owner region {local} does not match vehicle region {vehicle}")]
    RegionMismatch {
        /// The vehicle's region.
        vehicle: Region,
        /// The region of the service handling the request.
        local: Region,
    },

    /// The auction's lifecycle state does not permit the operation.
    #[error("State conflict for auction {auction_id}: {reason}")]
    StateConflict {
        /// The auction in the wrong state.
        auction_id: AuctionId,
        /// Why the operation was rejected.
        reason: String,
    },

    /// The version-guarded aggregate update lost a concurrent race.
    ///
    /// The bid row inserted before the update stands as a recorded attempt
    /// and remains visible to reconciliation; callers may retry with a
    /// fresh read.
    #[error("Concurrency conflict on auction {auction_id}: expected row version {expected}")]
    ConcurrencyConflict {
        /// The contended auction.
        auction_id: AuctionId,
        /// The row version the update expected.
        expected: u64,
    },

    /// The (auction, source-region, sequence) key was already used.
    #[error("Duplicate sequence {sequence} for auction {auction_id} from region {region}")]
    DuplicateSequence {
        /// The auction the bid targeted.
        auction_id: AuctionId,
        /// The region that produced the duplicate.
        region: Region,
        /// The sequence number already in use.
        sequence: Sequence,
    },

    /// The region is not known to the coordinator.
    #[error("Unknown region: {0}")]
    UnknownRegion(Region),

    /// The coordinator refused to execute against an unreachable region.
    #[error("Region {0} is unreachable due to partition")]
    RegionUnreachable(Region),

    /// A storage seam failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// An event payload could not be encoded or decoded.
    #[error(transparent)]
    Event(#[from] EventError),

    /// The local event bus failed.
    #[error(transparent)]
    Bus(#[from] EventBusError),
}

impl AuctionError {
    /// Whether the caller may retry the operation after a fresh read.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::ConcurrencyConflict { .. } | Self::Store(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn concurrency_conflict_is_retryable() {
        let err = AuctionError::ConcurrencyConflict {
            auction_id: AuctionId::new(),
            expected: 3,
        };
        assert!(err.is_retryable());
    }

    #[test]
    fn duplicate_is_not_retryable() {
        let err = AuctionError::DuplicateSequence {
            auction_id: AuctionId::new(),
            region: Region::Eu,
            sequence: Sequence::FIRST,
        };
        assert!(!err.is_retryable());
    }

    #[test]
    fn display_names_the_region() {
        let err = AuctionError::RegionUnreachable(Region::Eu);
        assert!(format!("{err}").contains("EU"));
    }
}
