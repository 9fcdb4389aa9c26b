//! Region partition coordinator.

use chrono::{DateTime, Utc};
use gavel_core::clock::Clock;
use gavel_core::error::AuctionError;
use gavel_core::link::LinkState;
use gavel_core::region::Region;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::broadcast;

/// A partition state transition, delivered to coordinator subscribers.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PartitionTransition {
    /// State before the transition.
    pub from: LinkState,
    /// State after the transition.
    pub to: LinkState,
    /// When the transition happened.
    pub at: DateTime<Utc>,
}

/// Snapshot of the coordinator's view of connectivity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PartitionStatus {
    /// Whether the inter-region link is currently partitioned.
    pub is_partitioned: bool,
    /// When the current partition started, if one is in progress.
    pub since: Option<DateTime<Utc>>,
    /// Reachability per known region.
    pub reachability: HashMap<Region, bool>,
}

#[derive(Debug)]
struct CoordinatorState {
    state: LinkState,
    since: Option<DateTime<Utc>>,
    reachability: HashMap<Region, bool>,
}

/// Tracks partition state and per-region reachability for one region's
/// runtime, and gates region-scoped execution on it.
///
/// Transitions are broadcast to subscribers over a `tokio::sync::broadcast`
/// channel; subscribers that fall behind lose the oldest notifications, not
/// the newest.
pub struct RegionCoordinator {
    state: Mutex<CoordinatorState>,
    transitions: broadcast::Sender<PartitionTransition>,
    clock: Arc<dyn Clock>,
}

impl RegionCoordinator {
    /// Create a connected coordinator that knows the given regions.
    #[must_use]
    pub fn new(known_regions: &[Region], clock: Arc<dyn Clock>) -> Self {
        let reachability = known_regions.iter().map(|r| (*r, true)).collect();
        let (transitions, _) = broadcast::channel(16);
        Self {
            state: Mutex::new(CoordinatorState {
                state: LinkState::Connected,
                since: None,
                reachability,
            }),
            transitions,
            clock,
        }
    }

    /// Mark every known region unreachable and notify subscribers.
    /// No-op if already partitioned.
    pub fn set_partitioned(&self) {
        self.transition(LinkState::Partitioned);
    }

    /// Mark every known region reachable, clear the partition start time,
    /// and notify subscribers. No-op if already connected.
    pub fn set_connected(&self) {
        self.transition(LinkState::Connected);
    }

    fn transition(&self, to: LinkState) {
        let transition = {
            let mut guard = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            if guard.state == to {
                return;
            }
            let at = self.clock.now();
            let from = guard.state;
            guard.state = to;
            guard.since = match to {
                LinkState::Partitioned => Some(at),
                _ => None,
            };
            let reachable = to != LinkState::Partitioned;
            for flag in guard.reachability.values_mut() {
                *flag = reachable;
            }
            PartitionTransition { from, to, at }
        };
        tracing::info!(from = %transition.from, to = %transition.to, "partition transition");
        // No receivers is fine; notifications are best-effort.
        let _ = self.transitions.send(transition);
    }

    /// Whether a region is currently reachable. Unknown regions are never
    /// reachable.
    #[must_use]
    pub fn is_region_reachable(&self, region: Region) -> bool {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .reachability
            .get(&region)
            .copied()
            .unwrap_or(false)
    }

    /// Snapshot of the current partition status.
    #[must_use]
    pub fn partition_status(&self) -> PartitionStatus {
        let guard = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        PartitionStatus {
            is_partitioned: guard.state == LinkState::Partitioned,
            since: guard.since,
            reachability: guard.reachability.clone(),
        }
    }

    /// Subscribe to partition transitions.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<PartitionTransition> {
        self.transitions.subscribe()
    }

    /// Run `operation` only if `region` is known and currently reachable.
    ///
    /// # Errors
    ///
    /// Returns [`AuctionError::UnknownRegion`] for a region the coordinator
    /// does not track, and [`AuctionError::RegionUnreachable`] while that
    /// region is partitioned away; in both cases `operation` is never
    /// invoked. Otherwise the operation's own result is returned untouched.
    pub async fn execute_in_region<T, F, Fut>(
        &self,
        region: Region,
        operation: F,
    ) -> Result<T, AuctionError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, AuctionError>>,
    {
        {
            let guard = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            match guard.reachability.get(&region) {
                None => return Err(AuctionError::UnknownRegion(region)),
                Some(false) => return Err(AuctionError::RegionUnreachable(region)),
                Some(true) => {}
            }
        }
        operation().await
    }
}

impl std::fmt::Debug for RegionCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegionCoordinator")
            .field("status", &self.partition_status())
            .finish_non_exhaustive()
    }
}
