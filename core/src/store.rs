//! Storage seams consumed by the auction services.
//!
//! Every durable collaborator sits behind a dyn-compatible trait so the
//! runtime can hold `Arc<dyn …>` handles and tests can swap deterministic
//! in-memory backends (the `gavel-memory` crate) for real engines without
//! touching service code.
//!
//! # Dyn Compatibility
//!
//! These traits use explicit `Pin<Box<dyn Future>>` returns (via the
//! [`StoreFuture`] alias) instead of `async fn` to enable trait-object
//! usage such as `Arc<dyn EventStore>`.

use crate::auction::{Auction, Bid};
use crate::event::EventEnvelope;
use crate::ids::{AuctionId, BidId, EventId, OutboxId, Sequence, VehicleId};
use crate::region::Region;
use crate::vehicle::Vehicle;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Boxed future returned by storage seams.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + Send + 'a>>;

/// Errors that can occur during storage operations.
#[derive(Error, Debug, Clone)]
pub enum StoreError {
    /// The backing engine failed.
    #[error("Storage backend error: {0}")]
    Backend(String),

    /// Stored data could not be (de)serialized.
    #[error("Storage serialization error: {0}")]
    Serialization(String),
}

/// Store of auction aggregates.
///
/// Mutable aggregate fields only change through [`try_update_amounts`]
/// (version-guarded) and [`save_winner`]; there is no unconditional update.
///
/// [`try_update_amounts`]: AuctionStore::try_update_amounts
/// [`save_winner`]: AuctionStore::save_winner
pub trait AuctionStore: Send + Sync {
    /// Fetch an auction by id.
    fn get(&self, id: AuctionId) -> StoreFuture<'_, Option<Auction>>;

    /// Insert a new auction, or replace a mirrored copy wholesale.
    fn upsert(&self, auction: Auction) -> StoreFuture<'_, ()>;

    /// Compare-and-swap update of the aggregate's high bid and sequence,
    /// guarded by the expected row version.
    ///
    /// Returns `Ok(true)` when the version matched and exactly this call
    /// advanced it by one; `Ok(false)` on a version mismatch (no change).
    /// Of two concurrent calls with the same expected version, at most one
    /// succeeds.
    fn try_update_amounts(
        &self,
        id: AuctionId,
        new_high: Decimal,
        new_seq: Sequence,
        expected_version: u64,
    ) -> StoreFuture<'_, bool>;

    /// Persist the winner reference chosen by reconciliation.
    fn save_winner(&self, id: AuctionId, winner: Option<BidId>) -> StoreFuture<'_, ()>;
}

/// Store of bid rows.
pub trait BidStore: Send + Sync {
    /// Insert a bid row.
    fn insert(&self, bid: Bid) -> StoreFuture<'_, ()>;

    /// Whether a bid with the given idempotency key already exists.
    fn exists(
        &self,
        auction_id: AuctionId,
        source_region: Region,
        sequence: Sequence,
    ) -> StoreFuture<'_, bool>;

    /// All bids recorded for an auction, in insertion order.
    fn all_for_auction(&self, auction_id: AuctionId) -> StoreFuture<'_, Vec<Bid>>;
}

/// Read-only vehicle catalog access plus the single-region CRUD the
/// catalog service needs.
pub trait VehicleStore: Send + Sync {
    /// Fetch a vehicle by id.
    fn get(&self, id: VehicleId) -> StoreFuture<'_, Option<Vehicle>>;

    /// Insert a vehicle.
    fn insert(&self, vehicle: Vehicle) -> StoreFuture<'_, ()>;

    /// All non-deleted vehicles in a region.
    fn list_by_region(&self, region: Region) -> StoreFuture<'_, Vec<Vehicle>>;

    /// Replace an existing vehicle.
    fn update(&self, vehicle: Vehicle) -> StoreFuture<'_, ()>;

    /// Soft-delete a vehicle; returns whether it existed.
    fn soft_delete(&self, id: VehicleId, at: DateTime<Utc>) -> StoreFuture<'_, bool>;
}

/// Durable append-only log of event envelopes.
pub trait EventStore: Send + Sync {
    /// Append an envelope. Never overwrites: envelopes are immutable.
    fn append(&self, envelope: EventEnvelope) -> StoreFuture<'_, ()>;

    /// Envelopes for an auction with creation time strictly after
    /// `since` (or all, when `None`), in the total replay order
    /// `(created_at, producer_region, event_id)`.
    fn query_since(
        &self,
        auction_id: AuctionId,
        since: Option<DateTime<Utc>>,
    ) -> StoreFuture<'_, Vec<EventEnvelope>>;

    /// Creation time of a given event id, used to convert a checkpoint's
    /// last-event reference into a time cursor. `None` in, `None` out.
    fn resolve_created_at(
        &self,
        event_id: Option<EventId>,
    ) -> StoreFuture<'_, Option<DateTime<Utc>>>;
}

/// A row in the transactional outbox.
///
/// Mirrors an [`EventEnvelope`] plus publication bookkeeping; exists solely
/// to guarantee at-least-once delivery decoupled from the transaction that
/// appended the event.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OutboxRow {
    /// Outbox row identity.
    pub id: OutboxId,
    /// The event this row will publish.
    pub event_id: EventId,
    /// The auction the event concerns.
    pub auction_id: AuctionId,
    /// Aggregate type tag (always "Auction" in this system).
    pub aggregate_type: String,
    /// Event type tag.
    pub event_type: String,
    /// JSON payload, copied from the envelope.
    pub payload: serde_json::Value,
    /// When the event was created.
    pub created_at: DateTime<Utc>,
    /// Whether the row has been published to the local bus.
    pub published: bool,
    /// When the row was published.
    pub published_at: Option<DateTime<Utc>>,
}

impl OutboxRow {
    /// Build an unpublished row from an envelope.
    #[must_use]
    pub fn pending(envelope: &EventEnvelope, aggregate_type: impl Into<String>) -> Self {
        Self {
            id: OutboxId::new(),
            event_id: envelope.event_id,
            auction_id: envelope.auction_id,
            aggregate_type: aggregate_type.into(),
            event_type: envelope.event_type.clone(),
            payload: envelope.payload.clone(),
            created_at: envelope.created_at,
            published: false,
            published_at: None,
        }
    }

    /// Rebuild the wire envelope this row mirrors.
    #[must_use]
    pub fn to_envelope(&self, producer_region: Region) -> EventEnvelope {
        EventEnvelope {
            event_id: self.event_id,
            producer_region,
            event_type: self.event_type.clone(),
            auction_id: self.auction_id,
            payload: self.payload.clone(),
            created_at: self.created_at,
        }
    }
}

/// Transactional "mailbox" of events pending publication.
///
/// Rows are never deleted by the core; retention is an external concern.
pub trait Outbox: Send + Sync {
    /// Insert an unpublished row, logically alongside the event append.
    fn enqueue(&self, row: OutboxRow) -> StoreFuture<'_, ()>;

    /// Unpublished rows ordered oldest-first, capped at `batch_size`.
    /// Rows are not removed; they stay pending until marked published.
    fn dequeue_pending(&self, batch_size: usize) -> StoreFuture<'_, Vec<OutboxRow>>;

    /// Flip the published flag and record the publish time.
    fn mark_published(&self, id: OutboxId, at: DateTime<Utc>) -> StoreFuture<'_, ()>;
}

/// Per-consuming-region record of event ids already applied; the sole
/// idempotency guard against at-least-once redelivery.
pub trait AppliedEventLedger: Send + Sync {
    /// Whether the event has already been applied in this region.
    fn is_applied(&self, event_id: EventId) -> StoreFuture<'_, bool>;

    /// Record the event as applied.
    fn mark_applied(&self, event_id: EventId, at: DateTime<Utc>) -> StoreFuture<'_, ()>;
}

/// Per-auction reconciliation progress marker.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationCheckpoint {
    /// The auction this checkpoint tracks.
    pub auction_id: AuctionId,
    /// The last event observed by a reconciliation pass, if any.
    pub last_event_id: Option<EventId>,
    /// When reconciliation last ran for this auction.
    pub last_run_at: DateTime<Utc>,
}

/// Store of reconciliation checkpoints. Checkpoints advance monotonically;
/// the `last_event_id` never reverts to an earlier event.
pub trait CheckpointStore: Send + Sync {
    /// Fetch the checkpoint for an auction.
    fn get(&self, auction_id: AuctionId) -> StoreFuture<'_, Option<ReconciliationCheckpoint>>;

    /// Insert or replace the checkpoint for an auction.
    fn upsert(
        &self,
        auction_id: AuctionId,
        last_event_id: Option<EventId>,
        last_run_at: DateTime<Utc>,
    ) -> StoreFuture<'_, ()>;
}

/// Read-only, staleness-bounded view of the auction store.
///
/// Snapshots returned are defensive copies, never live references into the
/// upstream store's state.
pub trait AuctionReadReplica: Send + Sync {
    /// Serve the cached snapshot while it is younger than the configured
    /// lag; otherwise re-fetch, cache, and return the fresh value.
    fn get_from_replica(&self, id: AuctionId) -> StoreFuture<'_, Option<Auction>>;

    /// Refresh the cached snapshot unconditionally, bypassing the lag check.
    fn force_refresh(&self, id: AuctionId) -> StoreFuture<'_, ()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{BidPlacedPayload, DomainEvent};

    #[test]
    #[allow(clippy::expect_used)] // Panics: Test will fail if encode fails
    fn outbox_row_mirrors_envelope() {
        let event = DomainEvent::BidPlaced(BidPlacedPayload {
            bid_id: BidId::new(),
            auction_id: AuctionId::new(),
            amount: Decimal::from(100),
            sequence: Sequence::FIRST,
            source_region: Region::Us,
            created_at: Utc::now(),
            partition_flag: false,
        });
        let envelope = event
            .to_envelope(EventId::new(), Region::Us, Utc::now())
            .expect("encode should succeed");

        let row = OutboxRow::pending(&envelope, "Auction");
        assert!(!row.published);
        assert!(row.published_at.is_none());
        assert_eq!(row.to_envelope(Region::Us), envelope);
    }
}
