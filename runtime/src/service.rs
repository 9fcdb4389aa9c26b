//! The auction write-path orchestrator.

use chrono::{DateTime, Utc};
use gavel_core::auction::{Auction, AuctionState, Bid};
use gavel_core::clock::Clock;
use gavel_core::error::AuctionError;
use gavel_core::event::{
    AuctionActivatedPayload, AuctionCreatedPayload, BidPlacedPayload, DomainEvent,
};
use gavel_core::ids::{AuctionId, BidId, EventId, Sequence, VehicleId};
use gavel_core::region::Region;
use gavel_core::resolver::decide_winner;
use gavel_core::store::{
    AuctionReadReplica, AuctionStore, BidStore, CheckpointStore, EventStore, Outbox, OutboxRow,
    VehicleStore,
};
use gavel_core::vehicle::VehicleSnapshot;
use rust_decimal::Decimal;
use std::sync::Arc;

use crate::coordinator::RegionCoordinator;
use crate::ordering::BidOrderingService;

/// Read consistency requested from [`AuctionService::get_auction`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ConsistencyLevel {
    /// Read the primary store directly.
    Strong,
    /// Read through the lagged replica; may be stale within its lag window.
    Eventual,
}

/// A bid placement request.
#[derive(Clone, Debug)]
pub struct PlaceBidRequest {
    /// Monetary amount offered.
    pub amount: Decimal,
    /// Optional bidder reference.
    pub bidder: Option<String>,
}

/// Successful outcome of a bid placement.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PlacedBid {
    /// The recorded bid.
    pub bid_id: BidId,
    /// The sequence assigned by the sequencer.
    pub sequence: Sequence,
}

/// Collaborators wired into an [`AuctionService`].
pub struct AuctionServiceDeps {
    /// The region this service runs in.
    pub local_region: Region,
    /// Auction aggregate store.
    pub auctions: Arc<dyn AuctionStore>,
    /// Bid store.
    pub bids: Arc<dyn BidStore>,
    /// Vehicle catalog, read-only from this service's perspective.
    pub vehicles: Arc<dyn VehicleStore>,
    /// Append-only event store.
    pub events: Arc<dyn EventStore>,
    /// Transactional outbox.
    pub outbox: Arc<dyn Outbox>,
    /// Reconciliation checkpoint store.
    pub checkpoints: Arc<dyn CheckpointStore>,
    /// Lagged read replica for eventual reads.
    pub replica: Arc<dyn AuctionReadReplica>,
    /// Per-region sequencer.
    pub ordering: Arc<BidOrderingService>,
    /// Partition coordinator; supplies the bid partition flag.
    pub coordinator: Arc<RegionCoordinator>,
    /// Time source.
    pub clock: Arc<dyn Clock>,
}

/// Orchestrates the auction write path for one region: create, activate,
/// place-bid, read-by-consistency-level, and reconcile.
///
/// Every accepted mutation appends its event to the event store and
/// enqueues it to the outbox before returning; publication to the bus is
/// the publisher's asynchronous concern and never blocks a caller.
pub struct AuctionService {
    deps: AuctionServiceDeps,
}

impl AuctionService {
    /// Create the service from its wired collaborators.
    #[must_use]
    pub fn new(deps: AuctionServiceDeps) -> Self {
        Self { deps }
    }

    /// The region this service runs in.
    #[must_use]
    pub fn local_region(&self) -> Region {
        self.deps.local_region
    }

    /// Create an auction in `Draft` state for a locally owned vehicle.
    ///
    /// # Errors
    ///
    /// [`AuctionError::VehicleNotFound`] if the vehicle is absent or
    /// soft-deleted, [`AuctionError::RegionMismatch`] if it belongs to
    /// another region, plus storage and encoding failures.
    pub async fn create_auction(
        &self,
        vehicle_id: VehicleId,
        ends_at: DateTime<Utc>,
    ) -> Result<Auction, AuctionError> {
        let vehicle = self
            .deps
            .vehicles
            .get(vehicle_id)
            .await?
            .filter(|v| v.deleted_at.is_none())
            .ok_or(AuctionError::VehicleNotFound(vehicle_id))?;
        if vehicle.region != self.deps.local_region {
            return Err(AuctionError::RegionMismatch {
                vehicle: vehicle.region,
                local: self.deps.local_region,
            });
        }

        let now = self.deps.clock.now();
        let auction = Auction::draft(AuctionId::new(), self.deps.local_region, ends_at, now);
        self.deps.auctions.upsert(auction.clone()).await?;

        self.record_event(&DomainEvent::AuctionCreated(AuctionCreatedPayload {
            auction_id: auction.id,
            owner_region: auction.owner_region,
            ends_at,
            vehicle: VehicleSnapshot::from(&vehicle),
            created_at: now,
        }))
        .await?;

        Ok(auction)
    }

    /// Transition an auction to `Active`.
    ///
    /// # Errors
    ///
    /// [`AuctionError::AuctionNotFound`] if absent,
    /// [`AuctionError::StateConflict`] if the auction already reached a
    /// terminal state, plus storage and encoding failures.
    pub async fn activate_auction(&self, auction_id: AuctionId) -> Result<Auction, AuctionError> {
        let mut auction = self
            .deps
            .auctions
            .get(auction_id)
            .await?
            .ok_or(AuctionError::AuctionNotFound(auction_id))?;
        if auction.state.is_terminal() {
            return Err(AuctionError::StateConflict {
                auction_id,
                reason: format!("cannot activate an auction in state {}", auction.state),
            });
        }

        let now = self.deps.clock.now();
        auction.state = AuctionState::Active;
        auction.updated_at = now;
        self.deps.auctions.upsert(auction.clone()).await?;

        self.record_event(&DomainEvent::AuctionActivated(AuctionActivatedPayload {
            auction_id,
            owner_region: auction.owner_region,
            ends_at: auction.ends_at,
            created_at: now,
        }))
        .await?;

        Ok(auction)
    }

    /// Place a bid on an auction.
    ///
    /// The bid is stamped with this service's local region as its source,
    /// and flagged when the coordinator currently reports a partition. On a
    /// lost optimistic-concurrency race the inserted bid row stands as a
    /// recorded attempt, no event is emitted, and the caller may retry with
    /// a fresh read.
    ///
    /// # Errors
    ///
    /// [`AuctionError::InvalidId`] for an unparseable id,
    /// [`AuctionError::Validation`] for a non-positive amount,
    /// [`AuctionError::AuctionNotFound`] if absent,
    /// [`AuctionError::StateConflict`] when not accepting bids or already
    /// past its end time, [`AuctionError::DuplicateSequence`] when the
    /// idempotency key is taken, and
    /// [`AuctionError::ConcurrencyConflict`] when the version-guarded
    /// aggregate update lost a race.
    pub async fn place_bid(
        &self,
        auction_id: &str,
        request: PlaceBidRequest,
    ) -> Result<PlacedBid, AuctionError> {
        let auction_id: AuctionId = auction_id
            .parse()
            .map_err(|_| AuctionError::InvalidId(auction_id.to_string()))?;
        if request.amount <= Decimal::ZERO {
            return Err(AuctionError::Validation(format!(
                "bid amount must be positive, got {}",
                request.amount
            )));
        }

        let auction = self
            .deps
            .auctions
            .get(auction_id)
            .await?
            .ok_or(AuctionError::AuctionNotFound(auction_id))?;
        if !auction.state.accepts_bids() {
            return Err(AuctionError::StateConflict {
                auction_id,
                reason: format!("auction in state {} does not accept bids", auction.state),
            });
        }
        let now = self.deps.clock.now();
        if now > auction.ends_at {
            return Err(AuctionError::StateConflict {
                auction_id,
                reason: format!("auction ended at {}", auction.ends_at),
            });
        }

        let sequence = self.deps.ordering.get_next_bid_sequence(auction_id).await;
        let source_region = self.deps.local_region;
        if self
            .deps
            .bids
            .exists(auction_id, source_region, sequence)
            .await?
        {
            return Err(AuctionError::DuplicateSequence {
                auction_id,
                region: source_region,
                sequence,
            });
        }

        let bid = Bid {
            id: BidId::new(),
            auction_id,
            amount: request.amount,
            sequence,
            source_region,
            created_at: now,
            partition_flag: self.deps.coordinator.partition_status().is_partitioned,
            bidder: request.bidder,
            updated_at: now,
            deleted_at: None,
        };
        self.deps.bids.insert(bid.clone()).await?;

        let new_high = auction
            .current_high_bid
            .map_or(request.amount, |high| high.max(request.amount));
        let updated = self
            .deps
            .auctions
            .try_update_amounts(auction_id, new_high, sequence, auction.row_version)
            .await?;
        if !updated {
            // The bid row stands as a recorded attempt for reconciliation.
            return Err(AuctionError::ConcurrencyConflict {
                auction_id,
                expected: auction.row_version,
            });
        }

        self.record_event(&DomainEvent::BidPlaced(BidPlacedPayload::from(&bid)))
            .await?;

        Ok(PlacedBid {
            bid_id: bid.id,
            sequence,
        })
    }

    /// Read an auction at the requested consistency level.
    ///
    /// # Errors
    ///
    /// [`AuctionError::AuctionNotFound`] if the record is absent at the
    /// chosen read path, plus storage failures.
    pub async fn get_auction(
        &self,
        auction_id: AuctionId,
        level: ConsistencyLevel,
    ) -> Result<Auction, AuctionError> {
        let found = match level {
            ConsistencyLevel::Strong => self.deps.auctions.get(auction_id).await?,
            ConsistencyLevel::Eventual => self.deps.replica.get_from_replica(auction_id).await?,
        };
        found.ok_or(AuctionError::AuctionNotFound(auction_id))
    }

    /// Recompute and persist the deterministic winner, then advance the
    /// reconciliation checkpoint.
    ///
    /// The checkpoint bounds only the event scan used to advance itself;
    /// winner computation always runs over the full current bid set, so
    /// reconciliation converges identically in every region regardless of
    /// event visibility at the time of the pass.
    ///
    /// # Errors
    ///
    /// [`AuctionError::AuctionNotFound`] if absent, plus storage failures.
    pub async fn reconcile_auction(
        &self,
        auction_id: AuctionId,
    ) -> Result<Option<BidId>, AuctionError> {
        let auction = self
            .deps
            .auctions
            .get(auction_id)
            .await?
            .ok_or(AuctionError::AuctionNotFound(auction_id))?;

        let checkpoint = self.deps.checkpoints.get(auction_id).await?;
        let cursor = self
            .deps
            .events
            .resolve_created_at(checkpoint.and_then(|c| c.last_event_id))
            .await?;
        let new_events = self.deps.events.query_since(auction_id, cursor).await?;

        let all_bids = self.deps.bids.all_for_auction(auction_id).await?;
        let winner = decide_winner(&auction, &all_bids);
        self.deps.auctions.save_winner(auction_id, winner).await?;

        let last_seen = new_events.last().map(|e| e.event_id);
        self.deps
            .checkpoints
            .upsert(auction_id, last_seen, self.deps.clock.now())
            .await?;

        Ok(winner)
    }

    async fn record_event(&self, event: &DomainEvent) -> Result<(), AuctionError> {
        let envelope = event.to_envelope(
            EventId::new(),
            self.deps.local_region,
            self.deps.clock.now(),
        )?;
        self.deps.events.append(envelope.clone()).await?;
        self.deps
            .outbox
            .enqueue(OutboxRow::pending(&envelope, "Auction"))
            .await?;
        Ok(())
    }
}

impl std::fmt::Debug for AuctionService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuctionService")
            .field("local_region", &self.deps.local_region)
            .finish_non_exhaustive()
    }
}
