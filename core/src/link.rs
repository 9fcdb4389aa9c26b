//! Inter-region link abstraction.
//!
//! The link is the only channel between regions. Partitioning affects
//! delivery, not acceptance: `send` always buffers, and messages are never
//! dropped. Delivery is explicit and pull-based — a consumer drains its own
//! mailbox; nothing is delivered automatically when the link heals.
//!
//! The trait is a capability interface so the in-process simulation
//! (`gavel-memory`) can be replaced by a durable message queue or
//! replicated log without touching the sync service.

use crate::event::EventEnvelope;
use crate::region::Region;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Connectivity state of the inter-region link.
///
/// `Healing` is a transitional marker only; it does not change buffering
/// semantics, since delivery is always explicit and pull-based.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LinkState {
    /// Regions can exchange messages (on drain).
    Connected,
    /// Cross-region delivery is deferred; sends keep buffering.
    Partitioned,
    /// Transitional marker between `Partitioned` and `Connected`.
    Healing,
}

impl fmt::Display for LinkState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Connected => "Connected",
            Self::Partitioned => "Partitioned",
            Self::Healing => "Healing",
        };
        f.write_str(s)
    }
}

/// Capability interface over the inter-region transport.
pub trait RegionLink: Send + Sync {
    /// Buffer an envelope for every region other than `from`.
    ///
    /// Always accepted, regardless of link state.
    fn send(&self, from: Region, envelope: EventEnvelope);

    /// Remove and return all envelopes addressed to `to`, in enqueue
    /// (FIFO) order. Draining is the only way messages leave a mailbox.
    fn drain_to(&self, to: Region) -> Vec<EventEnvelope>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn link_state_display() {
        assert_eq!(LinkState::Connected.to_string(), "Connected");
        assert_eq!(LinkState::Partitioned.to_string(), "Partitioned");
        assert_eq!(LinkState::Healing.to_string(), "Healing");
    }
}
