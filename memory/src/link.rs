//! Simulated inter-region link with controllable connectivity.

use gavel_core::event::EventEnvelope;
use gavel_core::link::{LinkState, RegionLink};
use gavel_core::region::Region;
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, PoisonError};

/// In-process [`RegionLink`] with one FIFO mailbox per region.
///
/// The link state is advisory: `send` buffers into every other region's
/// mailbox whether the link is connected or partitioned, and nothing is
/// delivered until someone drains. Flipping the state back to `Connected`
/// does not deliver anything by itself; the coordinator decides when the
/// sync services drain.
#[derive(Debug)]
pub struct SimulatedLink {
    state: Mutex<LinkState>,
    mailboxes: Mutex<HashMap<Region, VecDeque<EventEnvelope>>>,
}

impl SimulatedLink {
    /// Create a connected link with an empty mailbox per known region.
    #[must_use]
    pub fn new() -> Self {
        let mut mailboxes = HashMap::new();
        for region in Region::ALL {
            mailboxes.insert(region, VecDeque::new());
        }
        Self {
            state: Mutex::new(LinkState::Connected),
            mailboxes: Mutex::new(mailboxes),
        }
    }

    /// Current link state.
    #[must_use]
    pub fn state(&self) -> LinkState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Flip the link state.
    pub fn set_state(&self, state: LinkState) {
        let mut guard = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if *guard != state {
            tracing::debug!(from = %*guard, to = %state, "link state change");
        }
        *guard = state;
    }

    /// Number of envelopes waiting in a region's mailbox.
    #[must_use]
    pub fn pending_for(&self, region: Region) -> usize {
        self.mailboxes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&region)
            .map_or(0, VecDeque::len)
    }
}

impl Default for SimulatedLink {
    fn default() -> Self {
        Self::new()
    }
}

impl RegionLink for SimulatedLink {
    fn send(&self, from: Region, envelope: EventEnvelope) {
        let mut guard = self
            .mailboxes
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        for (region, mailbox) in guard.iter_mut() {
            if *region != from {
                mailbox.push_back(envelope.clone());
            }
        }
    }

    fn drain_to(&self, to: Region) -> Vec<EventEnvelope> {
        let mut guard = self
            .mailboxes
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        guard
            .get_mut(&to)
            .map(|mailbox| mailbox.drain(..).collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gavel_core::ids::{AuctionId, EventId};

    fn envelope(region: Region) -> EventEnvelope {
        EventEnvelope {
            event_id: EventId::new(),
            producer_region: region,
            event_type: "BidPlaced".to_owned(),
            auction_id: AuctionId::new(),
            payload: serde_json::json!({}),
            created_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn send_buffers_even_while_partitioned() {
        let link = SimulatedLink::new();
        link.set_state(LinkState::Partitioned);

        link.send(Region::Us, envelope(Region::Us));
        assert_eq!(link.pending_for(Region::Eu), 1);
        assert_eq!(link.pending_for(Region::Us), 0);
    }

    #[test]
    fn healing_delivers_nothing_without_a_drain() {
        let link = SimulatedLink::new();
        link.set_state(LinkState::Partitioned);
        link.send(Region::Eu, envelope(Region::Eu));

        link.set_state(LinkState::Connected);
        assert_eq!(link.pending_for(Region::Us), 1);

        let drained = link.drain_to(Region::Us);
        assert_eq!(drained.len(), 1);
        assert!(link.drain_to(Region::Us).is_empty());
    }

    #[test]
    fn drain_preserves_enqueue_order() {
        let link = SimulatedLink::new();
        let first = envelope(Region::Us);
        let second = envelope(Region::Us);
        link.send(Region::Us, first.clone());
        link.send(Region::Us, second.clone());

        let drained = link.drain_to(Region::Eu);
        assert_eq!(drained, vec![first, second]);
    }
}
