//! Per-region component wiring for integration tests.

use chrono::Duration;
use gavel_core::bus::EventBus;
use gavel_core::clock::Clock;
use gavel_core::error::AuctionError;
use gavel_core::link::RegionLink;
use gavel_core::region::Region;
use gavel_core::store::{
    AppliedEventLedger, AuctionReadReplica, AuctionStore, BidStore, CheckpointStore, EventStore,
    Outbox, VehicleStore,
};
use gavel_memory::{
    LaggedAuctionReplica, MemoryAppliedLedger, MemoryAuctionStore, MemoryBidStore,
    MemoryCheckpointStore, MemoryEventBus, MemoryEventStore, MemoryOutbox, MemoryVehicleStore,
    SimulatedLink,
};
use gavel_runtime::{
    AuctionService, AuctionServiceDeps, BidOrderingService, DatabaseSyncService, EventPublisher,
    RegionCoordinator, SyncDeps, VehicleService,
};
use std::sync::Arc;

/// One region's full component set over in-memory backends.
///
/// Regions share nothing but the [`SimulatedLink`] passed at construction;
/// everything else is an independent instance, matching the deployment
/// model where each region runs its own stack.
pub struct RegionHarness {
    /// The region this harness simulates.
    pub region: Region,
    /// Auction store, exposed for direct assertions.
    pub auctions: Arc<MemoryAuctionStore>,
    /// Bid store, exposed for direct assertions.
    pub bids: Arc<MemoryBidStore>,
    /// Vehicle store, exposed for seeding catalog rows.
    pub vehicles: Arc<MemoryVehicleStore>,
    /// Event store, exposed for append/redelivery assertions.
    pub events: Arc<MemoryEventStore>,
    /// Outbox, exposed for pending-row assertions.
    pub outbox: Arc<MemoryOutbox>,
    /// Local event bus.
    pub bus: Arc<MemoryEventBus>,
    /// Applied-event ledger.
    pub ledger: Arc<MemoryAppliedLedger>,
    /// Reconciliation checkpoints, exposed for cursor assertions.
    pub checkpoints: Arc<MemoryCheckpointStore>,
    /// Partition coordinator for this region.
    pub coordinator: Arc<RegionCoordinator>,
    /// Outbox publisher.
    pub publisher: EventPublisher,
    /// Sync service; holds the standing bus-to-link subscription.
    pub sync: DatabaseSyncService,
    /// The write-path orchestrator under test.
    pub service: AuctionService,
    /// Catalog service for seeding vehicles the idiomatic way.
    pub vehicle_service: VehicleService,
}

impl RegionHarness {
    /// Wire a region over the shared link, with the given replica lag.
    #[must_use]
    pub fn new(region: Region, link: &Arc<SimulatedLink>, clock: &Arc<dyn Clock>, replica_lag: Duration) -> Self {
        let auctions = Arc::new(MemoryAuctionStore::new());
        let bids = Arc::new(MemoryBidStore::new());
        let vehicles = Arc::new(MemoryVehicleStore::new());
        let events = Arc::new(MemoryEventStore::new());
        let outbox = Arc::new(MemoryOutbox::new());
        let bus = Arc::new(MemoryEventBus::new());
        let ledger = Arc::new(MemoryAppliedLedger::new());
        let checkpoints = Arc::new(MemoryCheckpointStore::new());
        let coordinator = Arc::new(RegionCoordinator::new(&Region::ALL, Arc::clone(clock)));
        let replica = Arc::new(LaggedAuctionReplica::new(
            Arc::clone(&auctions) as Arc<dyn AuctionStore>,
            Arc::clone(clock),
            replica_lag,
        ));
        let ordering = Arc::new(BidOrderingService::new(
            Arc::clone(&bids) as Arc<dyn BidStore>
        ));

        let publisher = EventPublisher::new(
            region,
            Arc::clone(&outbox) as Arc<dyn Outbox>,
            Arc::clone(&bus) as Arc<dyn EventBus>,
            Arc::clone(clock),
        );
        let sync = DatabaseSyncService::new(
            bus.as_ref(),
            SyncDeps {
                local_region: region,
                link: Arc::clone(link) as Arc<dyn RegionLink>,
                ledger: Arc::clone(&ledger) as Arc<dyn AppliedEventLedger>,
                auctions: Arc::clone(&auctions) as Arc<dyn AuctionStore>,
                bids: Arc::clone(&bids) as Arc<dyn BidStore>,
                events: Arc::clone(&events) as Arc<dyn EventStore>,
                clock: Arc::clone(clock),
            },
        );
        let service = AuctionService::new(AuctionServiceDeps {
            local_region: region,
            auctions: Arc::clone(&auctions) as Arc<dyn AuctionStore>,
            bids: Arc::clone(&bids) as Arc<dyn BidStore>,
            vehicles: Arc::clone(&vehicles) as Arc<dyn VehicleStore>,
            events: Arc::clone(&events) as Arc<dyn EventStore>,
            outbox: Arc::clone(&outbox) as Arc<dyn Outbox>,
            checkpoints: Arc::clone(&checkpoints) as Arc<dyn CheckpointStore>,
            replica: replica as Arc<dyn AuctionReadReplica>,
            ordering,
            coordinator: Arc::clone(&coordinator),
            clock: Arc::clone(clock),
        });
        let vehicle_service = VehicleService::new(
            region,
            Arc::clone(&vehicles) as Arc<dyn VehicleStore>,
            Arc::clone(clock),
        );

        Self {
            region,
            auctions,
            bids,
            vehicles,
            events,
            outbox,
            bus,
            ledger,
            checkpoints,
            coordinator,
            publisher,
            sync,
            service,
            vehicle_service,
        }
    }

    /// Publish all pending outbox rows onto the local bus, which the sync
    /// service forwards into the link.
    ///
    /// # Errors
    ///
    /// Propagates outbox failures.
    pub async fn publish_outbox(&self) -> Result<usize, AuctionError> {
        self.publisher.publish_pending(64).await
    }

    /// Drain and apply everything the link holds for this region.
    ///
    /// # Errors
    ///
    /// Propagates storage failures from the apply path.
    pub async fn drain_and_apply(&self) -> Result<usize, AuctionError> {
        self.sync.drain_and_apply().await
    }
}

impl std::fmt::Debug for RegionHarness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegionHarness")
            .field("region", &self.region)
            .finish_non_exhaustive()
    }
}
