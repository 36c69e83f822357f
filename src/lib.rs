//! VRSL DMX patch set generator.
//!
//! Reads a VRSL fixture export and a venue extras file, maps every fixture
//! onto its DMX universe, and renders an occupancy report.

pub mod audit;
pub mod config;
pub mod error;
pub mod loader;
pub mod logging;
pub mod model;
pub mod occupancy;
pub mod output;
pub mod report;

pub use error::{PatchError, Result};
pub use occupancy::{compute_occupancy, PatchConfig, PatchPlan};
