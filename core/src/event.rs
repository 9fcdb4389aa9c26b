//! Event envelope and typed domain event payloads.
//!
//! Events are immutable facts appended to the per-region event store and
//! replicated across regions through the outbox and the inter-region link.
//! Payloads are JSON-structured so both sides of the link agree on the wire
//! meaning regardless of language or build; region identifiers always travel
//! in their canonical string form ("US", "EU").
//!
//! Replay order is total and deterministic: `(created_at, producer_region,
//! event_id)`, compared lexicographically.

use crate::auction::Bid;
use crate::ids::{AuctionId, BidId, EventId, Sequence};
use crate::region::Region;
use crate::vehicle::VehicleSnapshot;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors that can occur while encoding or decoding event payloads.
#[derive(Error, Debug)]
pub enum EventError {
    /// Failed to serialize a payload to JSON.
    #[error("Failed to serialize event payload: {0}")]
    Serialization(String),

    /// Failed to deserialize a payload of a recognized event type.
    #[error("Failed to deserialize '{event_type}' payload: {reason}")]
    Deserialization {
        /// The event type tag whose payload was malformed.
        event_type: String,
        /// The underlying serde error.
        reason: String,
    },
}

/// Wire envelope for a single domain event.
///
/// Immutable once created; envelopes are shared freely after construction
/// and are never mutated by any component.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EventEnvelope {
    /// Event identity, the key of the applied-event ledger.
    pub event_id: EventId,
    /// The region that produced the event.
    pub producer_region: Region,
    /// Event type tag (e.g. "BidPlaced"). Unrecognized tags are tolerated
    /// by consumers as forward-compatible no-ops.
    pub event_type: String,
    /// The auction this event concerns.
    pub auction_id: AuctionId,
    /// JSON payload; shape depends on `event_type`.
    pub payload: serde_json::Value,
    /// When the event was created.
    pub created_at: DateTime<Utc>,
}

impl EventEnvelope {
    /// The total, deterministic replay-ordering key.
    #[must_use]
    pub fn replay_key(&self) -> (DateTime<Utc>, Region, EventId) {
        (self.created_at, self.producer_region, self.event_id)
    }
}

impl fmt::Display for EventEnvelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} from {} for auction {}",
            self.event_type, self.event_id, self.producer_region, self.auction_id
        )
    }
}

/// Payload of an `AuctionCreated` event.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AuctionCreatedPayload {
    /// The created auction.
    pub auction_id: AuctionId,
    /// Region that owns the auction.
    pub owner_region: Region,
    /// When the auction stops accepting bids.
    pub ends_at: DateTime<Utc>,
    /// Snapshot of the vehicle under auction.
    pub vehicle: VehicleSnapshot,
    /// When the auction was created.
    pub created_at: DateTime<Utc>,
}

/// Payload of an `AuctionActivated` event.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AuctionActivatedPayload {
    /// The activated auction.
    pub auction_id: AuctionId,
    /// Region that owns the auction.
    pub owner_region: Region,
    /// When the auction stops accepting bids.
    pub ends_at: DateTime<Utc>,
    /// When the activation happened.
    pub created_at: DateTime<Utc>,
}

/// Payload of a `BidPlaced` event.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BidPlacedPayload {
    /// The placed bid.
    pub bid_id: BidId,
    /// The auction the bid belongs to.
    pub auction_id: AuctionId,
    /// Monetary amount.
    pub amount: Decimal,
    /// Per-(auction, source-region) sequence number.
    pub sequence: Sequence,
    /// Where the bid was placed.
    pub source_region: Region,
    /// When the bid was placed.
    pub created_at: DateTime<Utc>,
    /// True when placed while the link was partitioned.
    pub partition_flag: bool,
}

impl From<&Bid> for BidPlacedPayload {
    fn from(bid: &Bid) -> Self {
        Self {
            bid_id: bid.id,
            auction_id: bid.auction_id,
            amount: bid.amount,
            sequence: bid.sequence,
            source_region: bid.source_region,
            created_at: bid.created_at,
            partition_flag: bid.partition_flag,
        }
    }
}

/// Typed view over the event types the auction lifecycle produces.
///
/// Consumers decode envelopes through [`DomainEvent::from_envelope`]; an
/// unknown `event_type` decodes to `Ok(None)` so newer producers do not
/// break older consumers.
#[derive(Clone, Debug, PartialEq)]
pub enum DomainEvent {
    /// A new auction was created in its owner region.
    AuctionCreated(AuctionCreatedPayload),
    /// An auction transitioned to `Active`.
    AuctionActivated(AuctionActivatedPayload),
    /// A bid was recorded.
    BidPlaced(BidPlacedPayload),
}

impl DomainEvent {
    /// The event type tag carried on the envelope.
    #[must_use]
    pub const fn event_type(&self) -> &'static str {
        match self {
            Self::AuctionCreated(_) => "AuctionCreated",
            Self::AuctionActivated(_) => "AuctionActivated",
            Self::BidPlaced(_) => "BidPlaced",
        }
    }

    /// The auction this event concerns.
    #[must_use]
    pub const fn auction_id(&self) -> AuctionId {
        match self {
            Self::AuctionCreated(p) => p.auction_id,
            Self::AuctionActivated(p) => p.auction_id,
            Self::BidPlaced(p) => p.auction_id,
        }
    }

    /// Wrap this event into a wire envelope.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::Serialization`] if the payload cannot be
    /// serialized to JSON.
    pub fn to_envelope(
        &self,
        event_id: EventId,
        producer_region: Region,
        created_at: DateTime<Utc>,
    ) -> Result<EventEnvelope, EventError> {
        let payload = match self {
            Self::AuctionCreated(p) => serde_json::to_value(p),
            Self::AuctionActivated(p) => serde_json::to_value(p),
            Self::BidPlaced(p) => serde_json::to_value(p),
        }
        .map_err(|e| EventError::Serialization(e.to_string()))?;

        Ok(EventEnvelope {
            event_id,
            producer_region,
            event_type: self.event_type().to_string(),
            auction_id: self.auction_id(),
            payload,
            created_at,
        })
    }

    /// Decode an envelope back into a typed event.
    ///
    /// Returns `Ok(None)` when the envelope's type tag is not one this
    /// version of the system recognizes.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::Deserialization`] when the type tag is known
    /// but the payload does not match its schema.
    pub fn from_envelope(envelope: &EventEnvelope) -> Result<Option<Self>, EventError> {
        fn decode<T: serde::de::DeserializeOwned>(
            envelope: &EventEnvelope,
        ) -> Result<T, EventError> {
            serde_json::from_value(envelope.payload.clone()).map_err(|e| {
                EventError::Deserialization {
                    event_type: envelope.event_type.clone(),
                    reason: e.to_string(),
                }
            })
        }

        match envelope.event_type.as_str() {
            "AuctionCreated" => Ok(Some(Self::AuctionCreated(decode(envelope)?))),
            "AuctionActivated" => Ok(Some(Self::AuctionActivated(decode(envelope)?))),
            "BidPlaced" => Ok(Some(Self::BidPlaced(decode(envelope)?))),
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)] // Panics: tests fail loudly on codec errors
mod tests {
    use super::*;
    use crate::vehicle::VehicleType;

    fn sample_bid_placed() -> DomainEvent {
        DomainEvent::BidPlaced(BidPlacedPayload {
            bid_id: BidId::new(),
            auction_id: AuctionId::new(),
            amount: Decimal::from(310),
            sequence: Sequence::FIRST,
            source_region: Region::Eu,
            created_at: Utc::now(),
            partition_flag: true,
        })
    }

    #[test]
    fn envelope_roundtrip_preserves_payload() {
        let event = sample_bid_placed();
        let envelope = event
            .to_envelope(EventId::new(), Region::Eu, Utc::now())
            .expect("encode should succeed");
        let decoded = DomainEvent::from_envelope(&envelope)
            .expect("decode should succeed")
            .expect("event type should be recognized");
        assert_eq!(decoded, event);
    }

    #[test]
    fn unknown_event_type_decodes_to_none() {
        let event = sample_bid_placed();
        let mut envelope = event
            .to_envelope(EventId::new(), Region::Us, Utc::now())
            .expect("encode should succeed");
        envelope.event_type = "AuctionArchived".to_string();
        let decoded = DomainEvent::from_envelope(&envelope).expect("decode should succeed");
        assert!(decoded.is_none());
    }

    #[test]
    fn malformed_payload_for_known_type_errors() {
        let envelope = EventEnvelope {
            event_id: EventId::new(),
            producer_region: Region::Us,
            event_type: "BidPlaced".to_string(),
            auction_id: AuctionId::new(),
            payload: serde_json::json!({ "nonsense": true }),
            created_at: Utc::now(),
        };
        assert!(DomainEvent::from_envelope(&envelope).is_err());
    }

    #[test]
    fn payload_regions_serialize_canonically() {
        let event = DomainEvent::AuctionCreated(AuctionCreatedPayload {
            auction_id: AuctionId::new(),
            owner_region: Region::Us,
            ends_at: Utc::now(),
            vehicle: VehicleSnapshot {
                vehicle_type: VehicleType::Suv,
                make: "Toyota".to_string(),
                model: "RAV4".to_string(),
                year: 2022,
            },
            created_at: Utc::now(),
        });
        let envelope = event
            .to_envelope(EventId::new(), Region::Us, Utc::now())
            .expect("encode should succeed");
        assert_eq!(envelope.payload["owner_region"], "US");
    }

    #[test]
    fn replay_key_orders_by_time_then_region_then_id() {
        let t0 = Utc::now();
        let t1 = t0 + chrono::Duration::seconds(1);
        let event = sample_bid_placed();
        let a = event
            .to_envelope(EventId::new(), Region::Eu, t0)
            .expect("encode should succeed");
        let b = event
            .to_envelope(EventId::new(), Region::Us, t1)
            .expect("encode should succeed");
        assert!(a.replay_key() < b.replay_key());
    }
}
