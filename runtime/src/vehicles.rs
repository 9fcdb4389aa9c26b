//! Single-region vehicle catalog service.
//!
//! Plain CRUD with no distributed concerns; the auction write path only
//! reads it to validate creation and snapshot vehicle details into
//! `AuctionCreated` payloads.

use chrono::Datelike;
use gavel_core::clock::Clock;
use gavel_core::error::AuctionError;
use gavel_core::ids::VehicleId;
use gavel_core::region::Region;
use gavel_core::store::VehicleStore;
use gavel_core::vehicle::{Vehicle, VehicleType};
use std::sync::Arc;

const FIRST_MODEL_YEAR: i32 = 1950;

/// Request to register a vehicle in the local region's catalog.
#[derive(Clone, Debug)]
pub struct CreateVehicleRequest {
    /// Body type, parsed case-insensitively ("Sedan", "SUV", ...).
    pub vehicle_type: String,
    /// Manufacturer.
    pub make: String,
    /// Model name.
    pub model: String,
    /// Model year.
    pub year: i32,
}

/// Partial update of a catalog vehicle; `None` fields keep their value.
#[derive(Clone, Debug, Default)]
pub struct UpdateVehicleRequest {
    /// New body type, if changing.
    pub vehicle_type: Option<String>,
    /// New manufacturer, if changing.
    pub make: Option<String>,
    /// New model name, if changing.
    pub model: Option<String>,
    /// New model year, if changing.
    pub year: Option<i32>,
}

/// Catalog CRUD for one region.
pub struct VehicleService {
    local_region: Region,
    vehicles: Arc<dyn VehicleStore>,
    clock: Arc<dyn Clock>,
}

impl VehicleService {
    /// Create the service over one region's vehicle store.
    #[must_use]
    pub fn new(local_region: Region, vehicles: Arc<dyn VehicleStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            local_region,
            vehicles,
            clock,
        }
    }

    /// Register a vehicle in the local region.
    ///
    /// # Errors
    ///
    /// [`AuctionError::Validation`] for an unsupported type, blank make or
    /// model, or a year outside the accepted range; plus storage failures.
    pub async fn create(&self, request: CreateVehicleRequest) -> Result<Vehicle, AuctionError> {
        let vehicle_type: VehicleType = request
            .vehicle_type
            .parse()
            .map_err(|_| AuctionError::Validation(format!(
                "unsupported vehicle type: {}",
                request.vehicle_type
            )))?;
        let now = self.clock.now();
        self.check_year(request.year)?;
        if request.make.trim().is_empty() || request.model.trim().is_empty() {
            return Err(AuctionError::Validation(
                "make and model must not be blank".to_owned(),
            ));
        }

        let vehicle = Vehicle {
            id: VehicleId::new(),
            region: self.local_region,
            vehicle_type,
            make: request.make,
            model: request.model,
            year: request.year,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        self.vehicles.insert(vehicle.clone()).await?;
        Ok(vehicle)
    }

    /// Fetch a vehicle; soft-deleted rows read as absent.
    ///
    /// # Errors
    ///
    /// [`AuctionError::VehicleNotFound`] if absent or soft-deleted.
    pub async fn get(&self, id: VehicleId) -> Result<Vehicle, AuctionError> {
        self.vehicles
            .get(id)
            .await?
            .filter(|v| v.deleted_at.is_none())
            .ok_or(AuctionError::VehicleNotFound(id))
    }

    /// All non-deleted vehicles in the local region.
    ///
    /// # Errors
    ///
    /// Returns [`AuctionError::Store`] if the store fails.
    pub async fn list(&self) -> Result<Vec<Vehicle>, AuctionError> {
        Ok(self.vehicles.list_by_region(self.local_region).await?)
    }

    /// Apply a partial update to a vehicle.
    ///
    /// # Errors
    ///
    /// [`AuctionError::VehicleNotFound`] if absent or soft-deleted;
    /// [`AuctionError::Validation`] for invalid replacement values.
    pub async fn update(
        &self,
        id: VehicleId,
        request: UpdateVehicleRequest,
    ) -> Result<Vehicle, AuctionError> {
        let mut vehicle = self.get(id).await?;

        if let Some(raw) = request.vehicle_type {
            vehicle.vehicle_type = raw
                .parse()
                .map_err(|_| AuctionError::Validation(format!("unsupported vehicle type: {raw}")))?;
        }
        if let Some(make) = request.make {
            if make.trim().is_empty() {
                return Err(AuctionError::Validation("make must not be blank".to_owned()));
            }
            vehicle.make = make;
        }
        if let Some(model) = request.model {
            if model.trim().is_empty() {
                return Err(AuctionError::Validation(
                    "model must not be blank".to_owned(),
                ));
            }
            vehicle.model = model;
        }
        if let Some(year) = request.year {
            self.check_year(year)?;
            vehicle.year = year;
        }

        vehicle.updated_at = self.clock.now();
        self.vehicles.update(vehicle.clone()).await?;
        Ok(vehicle)
    }

    /// Soft-delete a vehicle.
    ///
    /// # Errors
    ///
    /// [`AuctionError::VehicleNotFound`] if absent or already deleted.
    pub async fn delete(&self, id: VehicleId) -> Result<(), AuctionError> {
        if self.vehicles.soft_delete(id, self.clock.now()).await? {
            Ok(())
        } else {
            Err(AuctionError::VehicleNotFound(id))
        }
    }

    fn check_year(&self, year: i32) -> Result<(), AuctionError> {
        // Next model year is legitimately sold ahead of the calendar year.
        let max_year = self.clock.now().year() + 1;
        if (FIRST_MODEL_YEAR..=max_year).contains(&year) {
            Ok(())
        } else {
            Err(AuctionError::Validation(format!(
                "year must be between {FIRST_MODEL_YEAR} and {max_year}, got {year}"
            )))
        }
    }
}

impl std::fmt::Debug for VehicleService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VehicleService")
            .field("local_region", &self.local_region)
            .finish_non_exhaustive()
    }
}
