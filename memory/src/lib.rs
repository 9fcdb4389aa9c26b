//! # Gavel Memory
//!
//! In-memory implementations of every Gavel seam: the auction, bid, and
//! vehicle stores, the append-only event store, the transactional outbox,
//! the applied-event ledger, the reconciliation checkpoint store, the local
//! event bus, the simulated inter-region link, and the lagged read replica.
//!
//! Durable engines are deliberately out of scope for this system; these
//! backends are the concrete storage layer, and because they are fully
//! deterministic they double as the test backends for every scenario the
//! integration suite runs (partition, heal, redelivery, concurrency races).
//!
//! # Thread Safety
//!
//! The async store seams guard their state with `tokio::sync::RwLock`; the
//! synchronous bus and link use `std::sync::Mutex` and never hold a lock
//! across an await point or a subscriber callback.

pub mod auction_store;
pub mod bid_store;
pub mod bus;
pub mod checkpoint;
pub mod event_store;
pub mod ledger;
pub mod link;
pub mod outbox;
pub mod replica;
pub mod vehicle_store;

pub use auction_store::MemoryAuctionStore;
pub use bid_store::MemoryBidStore;
pub use bus::MemoryEventBus;
pub use checkpoint::MemoryCheckpointStore;
pub use event_store::MemoryEventStore;
pub use ledger::MemoryAppliedLedger;
pub use link::SimulatedLink;
pub use outbox::MemoryOutbox;
pub use replica::LaggedAuctionReplica;
pub use vehicle_store::MemoryVehicleStore;
