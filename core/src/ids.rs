//! Typed identifiers and the per-auction bid sequence counter.
//!
//! Every aggregate gets its own UUID newtype so identifiers cannot be mixed
//! up across function signatures. `Sequence` is the per-(auction, region)
//! bid counter used as part of the cross-region idempotency key.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// Error type for identifier parsing.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid identifier: {0}")]
pub struct ParseIdError(String);

macro_rules! uuid_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(Uuid);

        impl $name {
            /// Generate a fresh random identifier.
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Wrap an existing UUID.
            #[must_use]
            pub const fn from_uuid(id: Uuid) -> Self {
                Self(id)
            }

            /// Access the underlying UUID.
            #[must_use]
            pub const fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = ParseIdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s)
                    .map(Self)
                    .map_err(|_| ParseIdError(s.to_string()))
            }
        }
    };
}

uuid_id! {
    /// Unique identifier for an auction aggregate.
    AuctionId
}
uuid_id! {
    /// Unique identifier for a bid.
    BidId
}
uuid_id! {
    /// Unique identifier for an event envelope.
    EventId
}
uuid_id! {
    /// Unique identifier for a vehicle in the catalog.
    VehicleId
}
uuid_id! {
    /// Unique identifier for an outbox row.
    OutboxId
}

/// Per-(auction, source-region) bid sequence number.
///
/// Sequences start at 1 and increase strictly; 0 is never assigned and is
/// treated as invalid by bid-order validation. Together with the auction id
/// and source region, the sequence forms the duplicate-suppression key for
/// cross-region bid replication.
///
/// # Examples
///
/// ```
/// use gavel_core::ids::Sequence;
///
/// let first = Sequence::FIRST;
/// assert_eq!(first.value(), 1);
/// assert_eq!(first.next(), Sequence::new(2));
/// ```
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Sequence(u64);

impl Sequence {
    /// The first sequence assigned for any auction.
    pub const FIRST: Self = Self(1);

    /// Create a sequence with the given value.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Get the raw sequence number.
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }

    /// Get the next sequence (current + 1).
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }

    /// Whether this sequence can ever be assigned by the sequencer.
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.0 >= 1
    }
}

impl fmt::Display for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for Sequence {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<Sequence> for u64 {
    fn from(sequence: Sequence) -> Self {
        sequence.0
    }
}
