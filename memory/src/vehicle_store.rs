//! In-memory vehicle catalog store.

use chrono::{DateTime, Utc};
use gavel_core::ids::VehicleId;
use gavel_core::region::Region;
use gavel_core::store::{StoreFuture, VehicleStore};
use gavel_core::vehicle::Vehicle;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// In-memory [`VehicleStore`].
///
/// Soft-deleted rows keep their slot; `get` still returns them so callers
/// can distinguish "deleted" from "never existed", while `list_by_region`
/// hides them.
#[derive(Debug, Default, Clone)]
pub struct MemoryVehicleStore {
    vehicles: Arc<RwLock<HashMap<VehicleId, Vehicle>>>,
}

impl MemoryVehicleStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl VehicleStore for MemoryVehicleStore {
    fn get(&self, id: VehicleId) -> StoreFuture<'_, Option<Vehicle>> {
        let vehicles = Arc::clone(&self.vehicles);
        Box::pin(async move { Ok(vehicles.read().await.get(&id).cloned()) })
    }

    fn insert(&self, vehicle: Vehicle) -> StoreFuture<'_, ()> {
        let vehicles = Arc::clone(&self.vehicles);
        Box::pin(async move {
            vehicles.write().await.insert(vehicle.id, vehicle);
            Ok(())
        })
    }

    fn list_by_region(&self, region: Region) -> StoreFuture<'_, Vec<Vehicle>> {
        let vehicles = Arc::clone(&self.vehicles);
        Box::pin(async move {
            let guard = vehicles.read().await;
            let mut rows: Vec<Vehicle> = guard
                .values()
                .filter(|v| v.region == region && v.deleted_at.is_none())
                .cloned()
                .collect();
            rows.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
            Ok(rows)
        })
    }

    fn update(&self, vehicle: Vehicle) -> StoreFuture<'_, ()> {
        let vehicles = Arc::clone(&self.vehicles);
        Box::pin(async move {
            vehicles.write().await.insert(vehicle.id, vehicle);
            Ok(())
        })
    }

    fn soft_delete(&self, id: VehicleId, at: DateTime<Utc>) -> StoreFuture<'_, bool> {
        let vehicles = Arc::clone(&self.vehicles);
        Box::pin(async move {
            let mut guard = vehicles.write().await;
            match guard.get_mut(&id) {
                Some(vehicle) if vehicle.deleted_at.is_none() => {
                    vehicle.deleted_at = Some(at);
                    vehicle.updated_at = at;
                    Ok(true)
                }
                _ => Ok(false),
            }
        })
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)] // Panics: tests fail loudly on store errors
mod tests {
    use super::*;
    use gavel_core::vehicle::VehicleType;

    fn vehicle(region: Region) -> Vehicle {
        let now = Utc::now();
        Vehicle {
            id: VehicleId::new(),
            region,
            vehicle_type: VehicleType::Sedan,
            make: "Toyota".to_string(),
            model: "Camry".to_string(),
            year: 2022,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    #[tokio::test]
    async fn list_filters_region_and_hides_deleted() {
        let store = MemoryVehicleStore::new();
        let us = vehicle(Region::Us);
        let eu = vehicle(Region::Eu);
        let deleted = vehicle(Region::Us);
        let deleted_id = deleted.id;
        for v in [us.clone(), eu, deleted] {
            store.insert(v).await.expect("insert");
        }
        assert!(store
            .soft_delete(deleted_id, Utc::now())
            .await
            .expect("delete"));

        let listed = store.list_by_region(Region::Us).await.expect("list");
        assert_eq!(listed, vec![us]);
    }

    #[tokio::test]
    async fn soft_delete_is_not_repeatable_and_keeps_the_row() {
        let store = MemoryVehicleStore::new();
        let v = vehicle(Region::Eu);
        let id = v.id;
        store.insert(v).await.expect("insert");

        assert!(store.soft_delete(id, Utc::now()).await.expect("delete"));
        assert!(!store.soft_delete(id, Utc::now()).await.expect("delete"));
        assert!(!store
            .soft_delete(VehicleId::new(), Utc::now())
            .await
            .expect("delete"));

        let row = store.get(id).await.expect("get").expect("row kept");
        assert!(row.deleted_at.is_some());
    }
}
