//! Core domain types and error definitions for cropwatch.
//!
//! This crate provides the types shared across the cropwatch workspace:
//!
//! - [`Plant`]: a crop template with an expected growth duration
//! - [`Farm`] and [`PlantAssignment`]: a site and the plants growing on it
//! - [`ResolvedFarm`]: a farm with its plant references expanded
//! - [`PlantHealth`] and [`HealthStatus`]: per-assignment harvest date and health
//! - [`Prediction`]: a health classification reported by the camera service
//! - [`CropError`]: error type for domain operations
//!
//! # Example
//!
//! ```rust
//! use chrono::{Duration, Utc};
//! use cropwatch_core::{Farm, Plant};
//!
//! let tomato = Plant::new("p-1", "Tomato", 60);
//! let mut farm = Farm::new("f-1", "S1", "North field", "user-1");
//!
//! let now = Utc::now();
//! let assignment = farm.assign(&tomato, 12, now).unwrap();
//! assert_eq!(assignment.plant_health.harvest_date, now + Duration::days(60));
//! ```

mod model;
mod prediction;

pub use model::{
    Farm, HealthStatus, Plant, PlantAssignment, PlantHealth, ResolvedAssignment, ResolvedFarm,
};
pub use prediction::{latest_by_device, Prediction, HEALTHY_LABEL};

use thiserror::Error;

/// Errors that can occur in domain operations.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum CropError {
    /// Harvest date would fall outside the representable calendar.
    #[error("Harvest date out of range for life cycle of {0} days")]
    HarvestDateOutOfRange(i64),

    /// Stored health status could not be recognised.
    #[error("Unknown health status: {0}")]
    UnknownHealthStatus(String),
}
