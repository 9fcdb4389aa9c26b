//! Cross-region database sync service.

use gavel_core::auction::{Auction, AuctionState, Bid};
use gavel_core::bus::{EventBus, Subscription};
use gavel_core::clock::Clock;
use gavel_core::error::AuctionError;
use gavel_core::event::DomainEvent;
use gavel_core::link::RegionLink;
use gavel_core::region::Region;
use gavel_core::store::{AppliedEventLedger, AuctionStore, BidStore, EventStore};
use std::sync::Arc;

/// Collaborators wired into a [`DatabaseSyncService`].
pub struct SyncDeps {
    /// The region this service runs in.
    pub local_region: Region,
    /// The inter-region link.
    pub link: Arc<dyn RegionLink>,
    /// This region's applied-event ledger.
    pub ledger: Arc<dyn AppliedEventLedger>,
    /// This region's auction store.
    pub auctions: Arc<dyn AuctionStore>,
    /// This region's bid store.
    pub bids: Arc<dyn BidStore>,
    /// This region's event store.
    pub events: Arc<dyn EventStore>,
    /// Time source.
    pub clock: Arc<dyn Clock>,
}

/// Per-region actor bridging the local bus and the inter-region link.
///
/// Producer role: a standing bus subscription, taken at construction and
/// held for the service's lifetime, forwards every locally published
/// envelope into the link tagged with the local region as sender.
///
/// Consumer role: [`drain_and_apply`] pulls everything addressed to this
/// region and applies it idempotently. The applied-event ledger is the sole
/// guard against at-least-once redelivery; an event already in the ledger
/// is skipped without deserialization, application, or re-append.
///
/// [`drain_and_apply`]: DatabaseSyncService::drain_and_apply
pub struct DatabaseSyncService {
    local_region: Region,
    link: Arc<dyn RegionLink>,
    ledger: Arc<dyn AppliedEventLedger>,
    auctions: Arc<dyn AuctionStore>,
    bids: Arc<dyn BidStore>,
    events: Arc<dyn EventStore>,
    clock: Arc<dyn Clock>,
    _forwarding: Subscription,
}

impl DatabaseSyncService {
    /// Wire the service into its region's bus and link.
    ///
    /// Subscribing is a construction-time side effect: from this point on,
    /// every envelope published on `bus` is forwarded into the link.
    #[must_use]
    pub fn new(bus: &dyn EventBus, deps: SyncDeps) -> Self {
        let forward_link = Arc::clone(&deps.link);
        let local_region = deps.local_region;
        let forwarding = bus.subscribe(Arc::new(move |envelope| {
            forward_link.send(local_region, envelope.clone());
        }));

        Self {
            local_region: deps.local_region,
            link: deps.link,
            ledger: deps.ledger,
            auctions: deps.auctions,
            bids: deps.bids,
            events: deps.events,
            clock: deps.clock,
            _forwarding: forwarding,
        }
    }

    /// Drain everything addressed to this region and apply it.
    ///
    /// Returns the number of envelopes applied (ledgered and appended),
    /// counting forward-compatible no-ops for unknown event types.
    /// Malformed payloads of known types are logged and skipped without
    /// being ledgered, so a later corrected redelivery can still apply.
    ///
    /// # Errors
    ///
    /// Returns [`AuctionError::Store`] if a storage seam fails; the pass
    /// stops at the failing envelope.
    pub async fn drain_and_apply(&self) -> Result<usize, AuctionError> {
        let mut applied = 0;
        for envelope in self.link.drain_to(self.local_region) {
            if self.ledger.is_applied(envelope.event_id).await? {
                tracing::debug!(event = %envelope, "already applied, skipping");
                continue;
            }

            match DomainEvent::from_envelope(&envelope) {
                Ok(Some(event)) => self.apply(&event).await?,
                Ok(None) => {
                    tracing::debug!(event = %envelope, "unknown event type, applying as no-op");
                }
                Err(error) => {
                    tracing::warn!(event = %envelope, %error, "malformed payload, skipping");
                    continue;
                }
            }

            self.ledger
                .mark_applied(envelope.event_id, self.clock.now())
                .await?;
            self.events.append(envelope).await?;
            applied += 1;
        }
        Ok(applied)
    }

    async fn apply(&self, event: &DomainEvent) -> Result<(), AuctionError> {
        match event {
            DomainEvent::AuctionCreated(p) => {
                if self.auctions.get(p.auction_id).await?.is_none() {
                    let mirror =
                        Auction::draft(p.auction_id, p.owner_region, p.ends_at, p.created_at);
                    self.auctions.upsert(mirror).await?;
                }
            }
            DomainEvent::AuctionActivated(p) => {
                let mut auction = match self.auctions.get(p.auction_id).await? {
                    Some(existing) => existing,
                    None => Auction::draft(p.auction_id, p.owner_region, p.ends_at, p.created_at),
                };
                auction.state = AuctionState::Active;
                auction.updated_at = self.clock.now();
                self.auctions.upsert(auction).await?;
            }
            DomainEvent::BidPlaced(p) => {
                if !self
                    .bids
                    .exists(p.auction_id, p.source_region, p.sequence)
                    .await?
                {
                    self.bids
                        .insert(Bid {
                            id: p.bid_id,
                            auction_id: p.auction_id,
                            amount: p.amount,
                            sequence: p.sequence,
                            source_region: p.source_region,
                            created_at: p.created_at,
                            partition_flag: p.partition_flag,
                            bidder: None,
                            updated_at: p.created_at,
                            deleted_at: None,
                        })
                        .await?;
                }
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for DatabaseSyncService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseSyncService")
            .field("local_region", &self.local_region)
            .finish_non_exhaustive()
    }
}
