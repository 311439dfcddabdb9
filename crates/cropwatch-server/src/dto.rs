use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

// === Plant DTOs ===

#[derive(Debug, Deserialize)]
pub struct AddPlantRequest {
    pub name: String,
    pub life_cycle: i64,
}

impl AddPlantRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        require_text("name", &self.name)?;
        require_life_cycle(self.life_cycle)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdatePlantRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub life_cycle: Option<i64>,
}

impl UpdatePlantRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.name.is_none() && self.life_cycle.is_none() {
            return Err(AppError::BadRequest("Nothing to update: provide name or life_cycle.".into()));
        }
        if let Some(name) = &self.name {
            require_text("name", name)?;
        }
        if let Some(life_cycle) = self.life_cycle {
            require_life_cycle(life_cycle)?;
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
pub struct PlantNameInfo {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}

// === Farm DTOs ===

#[derive(Debug, Deserialize)]
pub struct RegisterFarmRequest {
    #[serde(rename = "serialNumber")]
    pub serial_number: String,
    #[serde(default)]
    pub name: String,
}

impl RegisterFarmRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        require_text("serialNumber", &self.serial_number)
    }
}

#[derive(Debug, Deserialize)]
pub struct AddPlantToFarmRequest {
    #[serde(rename = "serialNumber")]
    pub serial_number: String,
    #[serde(rename = "plantName")]
    pub plant_name: String,
    pub plant_count: u32,
}

impl AddPlantToFarmRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        require_text("serialNumber", &self.serial_number)?;
        require_text("plantName", &self.plant_name)?;
        if self.plant_count == 0 {
            return Err(AppError::BadRequest("plant_count must be at least 1.".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub struct FarmQuery {
    #[serde(rename = "serialNumber")]
    pub serial_number: String,
}

#[derive(Debug, Deserialize)]
pub struct FarmPlantQuery {
    #[serde(rename = "serialNumber")]
    pub serial_number: String,
    #[serde(rename = "plantName")]
    pub plant_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FarmPlantDetail {
    pub name: String,
    pub life_cycle: i64,
    pub plant_count: u32,
    pub harvest_date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FarmPlantSummary {
    pub name: String,
    pub plant_count: u32,
    pub harvest_date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HarvestDateInfo {
    pub name: String,
    pub harvest_date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserFarmInfo {
    #[serde(rename = "serialNumber")]
    pub serial_number: String,
    pub plants: Vec<UserFarmPlant>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserFarmPlant {
    pub name: String,
    pub plant_count: u32,
}

// === Health check DTOs ===

#[derive(Debug, Serialize)]
pub struct HealthCheckResponse {
    pub message: String,
    pub flagged_farms: Vec<String>,
}

fn require_text(field: &str, value: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::BadRequest(format!("{} cannot be empty.", field)));
    }
    Ok(())
}

/// Upper bound on `life_cycle`, a century of growth.
pub const MAX_LIFE_CYCLE_DAYS: i64 = 36_500;

fn require_life_cycle(life_cycle: i64) -> Result<(), AppError> {
    if life_cycle < 0 {
        return Err(AppError::BadRequest("life_cycle cannot be negative.".into()));
    }
    if life_cycle > MAX_LIFE_CYCLE_DAYS {
        return Err(AppError::BadRequest(format!(
            "life_cycle cannot exceed {} days.",
            MAX_LIFE_CYCLE_DAYS
        )));
    }
    Ok(())
}
