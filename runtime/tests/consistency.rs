//! Strong versus eventual reads through the lagged replica.

#![allow(clippy::expect_used)] // Panics: tests fail loudly on wiring errors

use chrono::{Duration, Utc};
use gavel_core::clock::Clock;
use gavel_core::error::AuctionError;
use gavel_core::region::Region;
use gavel_memory::SimulatedLink;
use gavel_runtime::{ConsistencyLevel, CreateVehicleRequest, PlaceBidRequest};
use gavel_testing::{ManualClock, RegionHarness};
use rust_decimal::Decimal;
use std::sync::Arc;

#[tokio::test]
async fn eventual_reads_lag_behind_strong_reads_by_the_configured_window() {
    let link = Arc::new(SimulatedLink::new());
    let manual = Arc::new(ManualClock::starting_at(Utc::now()));
    let clock: Arc<dyn Clock> = Arc::clone(&manual) as Arc<dyn Clock>;
    let region = RegionHarness::new(Region::Us, &link, &clock, Duration::seconds(5));

    let vehicle = region
        .vehicle_service
        .create(CreateVehicleRequest {
            vehicle_type: "Hatchback".to_owned(),
            make: "VW".to_owned(),
            model: "Golf".to_owned(),
            year: 2020,
        })
        .await
        .expect("vehicle");
    let auction = region
        .service
        .create_auction(vehicle.id, manual.now() + Duration::minutes(10))
        .await
        .expect("create");
    region
        .service
        .activate_auction(auction.id)
        .await
        .expect("activate");

    // Warm the replica with the pre-bid snapshot.
    let warm = region
        .service
        .get_auction(auction.id, ConsistencyLevel::Eventual)
        .await
        .expect("eventual read");
    assert!(warm.current_high_bid.is_none());

    region
        .service
        .place_bid(
            &auction.id.to_string(),
            PlaceBidRequest {
                amount: Decimal::from(500),
                bidder: Some("collector-7".to_owned()),
            },
        )
        .await
        .expect("bid");

    // Inside the lag window the replica still serves the stale snapshot,
    // while a strong read sees the bid immediately.
    manual.advance(Duration::seconds(4));
    let stale = region
        .service
        .get_auction(auction.id, ConsistencyLevel::Eventual)
        .await
        .expect("eventual read");
    assert!(stale.current_high_bid.is_none());

    let strong = region
        .service
        .get_auction(auction.id, ConsistencyLevel::Strong)
        .await
        .expect("strong read");
    assert_eq!(strong.current_high_bid, Some(Decimal::from(500)));

    // Past the window the replica refetches.
    manual.advance(Duration::seconds(2));
    let fresh = region
        .service
        .get_auction(auction.id, ConsistencyLevel::Eventual)
        .await
        .expect("eventual read");
    assert_eq!(fresh.current_high_bid, Some(Decimal::from(500)));
}

#[tokio::test]
async fn both_read_paths_report_missing_auctions_distinctly() {
    let link = Arc::new(SimulatedLink::new());
    let manual = Arc::new(ManualClock::starting_at(Utc::now()));
    let clock: Arc<dyn Clock> = Arc::clone(&manual) as Arc<dyn Clock>;
    let region = RegionHarness::new(Region::Eu, &link, &clock, Duration::seconds(5));

    let missing = gavel_core::ids::AuctionId::new();
    for level in [ConsistencyLevel::Strong, ConsistencyLevel::Eventual] {
        let err = region
            .service
            .get_auction(missing, level)
            .await
            .expect_err("absent auction");
        assert!(matches!(err, AuctionError::AuctionNotFound(id) if id == missing));
    }
}

#[tokio::test]
async fn bids_after_the_end_time_are_rejected() {
    let link = Arc::new(SimulatedLink::new());
    let manual = Arc::new(ManualClock::starting_at(Utc::now()));
    let clock: Arc<dyn Clock> = Arc::clone(&manual) as Arc<dyn Clock>;
    let region = RegionHarness::new(Region::Us, &link, &clock, Duration::seconds(5));

    let vehicle = region
        .vehicle_service
        .create(CreateVehicleRequest {
            vehicle_type: "Sedan".to_owned(),
            make: "Mazda".to_owned(),
            model: "3".to_owned(),
            year: 2019,
        })
        .await
        .expect("vehicle");
    let auction = region
        .service
        .create_auction(vehicle.id, manual.now() + Duration::minutes(1))
        .await
        .expect("create");
    region
        .service
        .activate_auction(auction.id)
        .await
        .expect("activate");

    manual.advance(Duration::minutes(2));
    let err = region
        .service
        .place_bid(
            &auction.id.to_string(),
            PlaceBidRequest {
                amount: Decimal::from(100),
                bidder: None,
            },
        )
        .await
        .expect_err("ended auction");
    assert!(matches!(err, AuctionError::StateConflict { .. }));
}

#[tokio::test]
async fn unparseable_and_nonpositive_requests_are_validation_errors() {
    let link = Arc::new(SimulatedLink::new());
    let manual = Arc::new(ManualClock::starting_at(Utc::now()));
    let clock: Arc<dyn Clock> = Arc::clone(&manual) as Arc<dyn Clock>;
    let region = RegionHarness::new(Region::Us, &link, &clock, Duration::seconds(5));

    let err = region
        .service
        .place_bid(
            "not-a-uuid",
            PlaceBidRequest {
                amount: Decimal::from(100),
                bidder: None,
            },
        )
        .await
        .expect_err("bad id");
    assert!(matches!(err, AuctionError::InvalidId(_)));

    let err = region
        .service
        .place_bid(
            &gavel_core::ids::AuctionId::new().to_string(),
            PlaceBidRequest {
                amount: Decimal::ZERO,
                bidder: None,
            },
        )
        .await
        .expect_err("zero amount");
    assert!(matches!(err, AuctionError::Validation(_)));
}
