//! # Gavel Runtime
//!
//! The per-region services of the Gavel auction backend. Each region runs
//! its own independent instance of every service here; the only channel
//! between regions is the inter-region link behind the sync service.
//!
//! - [`ordering::BidOrderingService`] — per-auction bid sequencing and
//!   sequence classification
//! - [`publisher::EventPublisher`] — outbox poller that moves pending rows
//!   onto the local bus
//! - [`sync::DatabaseSyncService`] — forwards local events into the link
//!   and idempotently applies remote ones
//! - [`coordinator::RegionCoordinator`] — partition state, reachability,
//!   transition notifications, region-gated execution
//! - [`service::AuctionService`] — the write-path orchestrator
//! - [`vehicles::VehicleService`] — single-region vehicle catalog

pub mod coordinator;
pub mod ordering;
pub mod publisher;
pub mod service;
pub mod sync;
pub mod vehicles;

pub use coordinator::{PartitionStatus, PartitionTransition, RegionCoordinator};
pub use ordering::{BidOrder, BidOrderingService};
pub use publisher::EventPublisher;
pub use service::{AuctionService, AuctionServiceDeps, ConsistencyLevel, PlaceBidRequest, PlacedBid};
pub use sync::{DatabaseSyncService, SyncDeps};
pub use vehicles::{CreateVehicleRequest, UpdateVehicleRequest, VehicleService};
