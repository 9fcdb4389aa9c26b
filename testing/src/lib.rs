//! # Gavel Testing
//!
//! Deterministic test clocks and the [`RegionHarness`], which wires one
//! region's full component set over shared in-memory backends. Integration
//! tests build one harness per region over a shared [`SimulatedLink`] and
//! drive partition, heal, and reconciliation scenarios by hand.
//!
//! [`SimulatedLink`]: gavel_memory::SimulatedLink

pub mod clock;
pub mod harness;

pub use clock::{FixedClock, ManualClock};
pub use harness::RegionHarness;
