//! Vehicle catalog types.
//!
//! The catalog itself is plain single-region persistence; the core only
//! reads it to validate auction creation and to embed a snapshot into
//! `AuctionCreated` events.

use crate::ids::VehicleId;
use crate::region::Region;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error type for vehicle type parsing.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unsupported vehicle type: {0}")]
pub struct ParseVehicleTypeError(String);

/// Supported vehicle body types.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VehicleType {
    /// Sedan.
    Sedan,
    /// Sport utility vehicle.
    #[serde(rename = "SUV")]
    Suv,
    /// Hatchback.
    Hatchback,
    /// Truck.
    Truck,
}

impl VehicleType {
    /// Canonical catalog spelling.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sedan => "Sedan",
            Self::Suv => "SUV",
            Self::Hatchback => "Hatchback",
            Self::Truck => "Truck",
        }
    }
}

impl fmt::Display for VehicleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VehicleType {
    type Err = ParseVehicleTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sedan" => Ok(Self::Sedan),
            "suv" => Ok(Self::Suv),
            "hatchback" => Ok(Self::Hatchback),
            "truck" => Ok(Self::Truck),
            other => Err(ParseVehicleTypeError(other.to_string())),
        }
    }
}

/// A catalog vehicle.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
    /// Vehicle identity.
    pub id: VehicleId,
    /// The region that owns this catalog entry.
    pub region: Region,
    /// Body type.
    pub vehicle_type: VehicleType,
    /// Manufacturer.
    pub make: String,
    /// Model name.
    pub model: String,
    /// Model year.
    pub year: i32,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last-update timestamp.
    pub updated_at: DateTime<Utc>,
    /// Soft-delete timestamp.
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Immutable vehicle details embedded in `AuctionCreated` payloads.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleSnapshot {
    /// Body type.
    pub vehicle_type: VehicleType,
    /// Manufacturer.
    pub make: String,
    /// Model name.
    pub model: String,
    /// Model year.
    pub year: i32,
}

impl From<&Vehicle> for VehicleSnapshot {
    fn from(vehicle: &Vehicle) -> Self {
        Self {
            vehicle_type: vehicle.vehicle_type,
            make: vehicle.make.clone(),
            model: vehicle.model.clone(),
            year: vehicle.year,
        }
    }
}
