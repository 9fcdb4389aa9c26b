//! Lagged read replica over an auction store.

use chrono::{DateTime, Duration, Utc};
use gavel_core::auction::Auction;
use gavel_core::clock::Clock;
use gavel_core::ids::AuctionId;
use gavel_core::store::{AuctionReadReplica, AuctionStore, StoreFuture};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Clone)]
struct CachedSnapshot {
    auction: Option<Auction>,
    fetched_at: DateTime<Utc>,
}

/// Staleness-bounded [`AuctionReadReplica`] over any [`AuctionStore`].
///
/// A snapshot fetched at `t` keeps being served until `t + lag`, after
/// which the next read re-fetches from upstream. Negative cache included:
/// "auction absent upstream" is itself a snapshot and stays stale for the
/// full lag window. With `cold_start` the replica serves `None` for ids it
/// has never fetched instead of reading through, modelling a replica that
/// has not caught up yet.
pub struct LaggedAuctionReplica {
    upstream: Arc<dyn AuctionStore>,
    clock: Arc<dyn Clock>,
    lag: Duration,
    cold_start: bool,
    cache: Arc<RwLock<HashMap<AuctionId, CachedSnapshot>>>,
}

impl LaggedAuctionReplica {
    /// Create a read-through replica with the given staleness bound.
    #[must_use]
    pub fn new(upstream: Arc<dyn AuctionStore>, clock: Arc<dyn Clock>, lag: Duration) -> Self {
        Self {
            upstream,
            clock,
            lag,
            cold_start: false,
            cache: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Serve `None` for never-fetched ids instead of reading through.
    #[must_use]
    pub fn with_cold_start(mut self) -> Self {
        self.cold_start = true;
        self
    }
}

impl std::fmt::Debug for LaggedAuctionReplica {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LaggedAuctionReplica")
            .field("lag", &self.lag)
            .field("cold_start", &self.cold_start)
            .finish_non_exhaustive()
    }
}

impl AuctionReadReplica for LaggedAuctionReplica {
    fn get_from_replica(&self, id: AuctionId) -> StoreFuture<'_, Option<Auction>> {
        Box::pin(async move {
            let now = self.clock.now();
            {
                let guard = self.cache.read().await;
                match guard.get(&id) {
                    Some(snapshot) if now - snapshot.fetched_at < self.lag => {
                        return Ok(snapshot.auction.clone());
                    }
                    Some(_) => {}
                    None if self.cold_start => return Ok(None),
                    None => {}
                }
            }

            let fresh = self.upstream.get(id).await?;
            self.cache.write().await.insert(
                id,
                CachedSnapshot {
                    auction: fresh.clone(),
                    fetched_at: now,
                },
            );
            Ok(fresh)
        })
    }

    fn force_refresh(&self, id: AuctionId) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            let fresh = self.upstream.get(id).await?;
            self.cache.write().await.insert(
                id,
                CachedSnapshot {
                    auction: fresh,
                    fetched_at: self.clock.now(),
                },
            );
            Ok(())
        })
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)] // Panics: tests fail loudly on store errors
mod tests {
    use super::*;
    use crate::auction_store::MemoryAuctionStore;
    use gavel_core::ids::Sequence;
    use gavel_core::region::Region;
    use rust_decimal::Decimal;
    use std::sync::Mutex;

    struct StepClock {
        now: Mutex<DateTime<Utc>>,
    }

    impl StepClock {
        fn new(start: DateTime<Utc>) -> Self {
            Self {
                now: Mutex::new(start),
            }
        }

        fn advance(&self, by: Duration) {
            *self.now.lock().expect("clock lock") += by;
        }
    }

    impl Clock for StepClock {
        fn now(&self) -> DateTime<Utc> {
            *self.now.lock().expect("clock lock")
        }
    }

    #[tokio::test]
    async fn replica_serves_stale_value_inside_lag_window() {
        let store = Arc::new(MemoryAuctionStore::new());
        let now = Utc::now();
        let auction = Auction::draft(AuctionId::new(), Region::Us, now + Duration::minutes(5), now);
        let id = auction.id;
        store.upsert(auction).await.expect("upsert");

        let clock = Arc::new(StepClock::new(now));
        let replica = LaggedAuctionReplica::new(
            Arc::clone(&store) as Arc<dyn AuctionStore>,
            Arc::clone(&clock) as Arc<dyn Clock>,
            Duration::seconds(5),
        );

        let first = replica.get_from_replica(id).await.expect("read");
        assert_eq!(first.as_ref().map(|a| a.row_version), Some(0));

        // Upstream advances; the replica must not see it yet.
        assert!(store
            .try_update_amounts(id, Decimal::from(100), Sequence::FIRST, 0)
            .await
            .expect("cas"));
        clock.advance(Duration::seconds(4));
        let stale = replica.get_from_replica(id).await.expect("read");
        assert_eq!(stale.as_ref().map(|a| a.row_version), Some(0));

        // Past the lag boundary the next read refetches.
        clock.advance(Duration::seconds(2));
        let fresh = replica.get_from_replica(id).await.expect("read");
        assert_eq!(fresh.as_ref().map(|a| a.row_version), Some(1));
    }

    #[tokio::test]
    async fn force_refresh_bypasses_the_lag_window() {
        let store = Arc::new(MemoryAuctionStore::new());
        let now = Utc::now();
        let auction = Auction::draft(AuctionId::new(), Region::Eu, now + Duration::minutes(5), now);
        let id = auction.id;
        store.upsert(auction).await.expect("upsert");

        let clock = Arc::new(StepClock::new(now));
        let replica = LaggedAuctionReplica::new(
            Arc::clone(&store) as Arc<dyn AuctionStore>,
            Arc::clone(&clock) as Arc<dyn Clock>,
            Duration::minutes(10),
        );

        assert!(replica.get_from_replica(id).await.expect("read").is_some());
        assert!(store
            .try_update_amounts(id, Decimal::from(50), Sequence::FIRST, 0)
            .await
            .expect("cas"));

        replica.force_refresh(id).await.expect("refresh");
        let seen = replica.get_from_replica(id).await.expect("read");
        assert_eq!(seen.as_ref().map(|a| a.row_version), Some(1));
    }

    #[tokio::test]
    async fn cold_start_replica_misses_until_refreshed() {
        let store = Arc::new(MemoryAuctionStore::new());
        let now = Utc::now();
        let auction = Auction::draft(AuctionId::new(), Region::Us, now + Duration::minutes(5), now);
        let id = auction.id;
        store.upsert(auction).await.expect("upsert");

        let clock = Arc::new(StepClock::new(now));
        let replica = LaggedAuctionReplica::new(
            Arc::clone(&store) as Arc<dyn AuctionStore>,
            Arc::clone(&clock) as Arc<dyn Clock>,
            Duration::seconds(5),
        )
        .with_cold_start();

        assert!(replica.get_from_replica(id).await.expect("read").is_none());
        replica.force_refresh(id).await.expect("refresh");
        assert!(replica.get_from_replica(id).await.expect("read").is_some());
    }

    #[tokio::test]
    async fn absence_is_cached_for_the_lag_window() {
        let store = Arc::new(MemoryAuctionStore::new());
        let now = Utc::now();
        let clock = Arc::new(StepClock::new(now));
        let replica = LaggedAuctionReplica::new(
            Arc::clone(&store) as Arc<dyn AuctionStore>,
            Arc::clone(&clock) as Arc<dyn Clock>,
            Duration::seconds(5),
        );

        let id = AuctionId::new();
        assert!(replica.get_from_replica(id).await.expect("read").is_none());

        let auction = Auction::draft(id, Region::Us, now + Duration::minutes(5), now);
        store.upsert(auction).await.expect("upsert");

        // Still inside the window: the cached miss wins.
        assert!(replica.get_from_replica(id).await.expect("read").is_none());
        clock.advance(Duration::seconds(6));
        assert!(replica.get_from_replica(id).await.expect("read").is_some());
    }
}
