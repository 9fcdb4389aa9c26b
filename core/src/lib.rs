//! # Gavel Core
//!
//! Core domain types and trait seams for the Gavel multi-region auction
//! backend.
//!
//! Gavel keeps a single logical auction consistent while two regions
//! independently accept bids during network partitions, then reconciles
//! deterministically after healing. This crate holds everything the
//! per-region runtime services share:
//!
//! - The domain model: [`auction::Auction`], [`auction::Bid`],
//!   [`vehicle::Vehicle`], typed identifiers, and [`region::Region`]
//! - The event model: [`event::EventEnvelope`] and the typed
//!   [`event::DomainEvent`] payloads replicated across regions
//! - Trait seams for every durable collaborator ([`store`]), the local
//!   event bus ([`bus`]), and the inter-region link ([`link`])
//! - The pure, deterministic winner-resolution algorithm ([`resolver`])
//! - The error taxonomy ([`error::AuctionError`]) and the [`clock::Clock`]
//!   time seam
//!
//! ## Architecture
//!
//! ```text
//! place bid ──► AuctionService ──► Sequencer ──► Bid insert ──► CAS update
//!                     │
//!                     ▼
//!             EventStore append + Outbox enqueue      (same transaction)
//!                     │
//!                     ▼  publisher poll
//!               local EventBus ──► SyncService ──► RegionLink mailbox
//!                                                        │ drain
//!                                                        ▼
//!                                      remote SyncService applies
//!                                      idempotently via the ledger
//! ```
//!
//! Concrete in-memory backends live in `gavel-memory`; the per-region
//! services live in `gavel-runtime`.

pub mod auction;
pub mod bus;
pub mod clock;
pub mod error;
pub mod event;
pub mod ids;
pub mod link;
pub mod region;
pub mod resolver;
pub mod store;
pub mod vehicle;

pub use auction::{Auction, AuctionState, Bid};
pub use error::AuctionError;
pub use event::{DomainEvent, EventEnvelope};
pub use ids::{AuctionId, BidId, EventId, OutboxId, Sequence, VehicleId};
pub use region::Region;
pub use vehicle::{Vehicle, VehicleSnapshot, VehicleType};

// Re-export commonly used external types
pub use chrono::{DateTime, Utc};
pub use rust_decimal::Decimal;
