//! Plant, farm and assignment records.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize, Serializer};

use crate::CropError;

/// A crop template with an expected growth duration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plant {
    /// Unique plant identifier.
    pub id: String,
    /// Display name, matched exactly when assigning to a farm.
    pub name: String,
    /// Days from planting to harvest.
    pub life_cycle: i64,
}

impl Plant {
    pub fn new(id: impl Into<String>, name: impl Into<String>, life_cycle: i64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            life_cycle,
        }
    }

    /// Projected harvest date for a planting made at `planted_at`.
    pub fn harvest_date_from(&self, planted_at: DateTime<Utc>) -> Result<DateTime<Utc>, CropError> {
        Duration::try_days(self.life_cycle)
            .and_then(|cycle| planted_at.checked_add_signed(cycle))
            .ok_or(CropError::HarvestDateOutOfRange(self.life_cycle))
    }
}

/// Health of a plant assignment.
///
/// The only transition is `Healthy -> Flagged`; a flagged assignment stays
/// flagged for the rest of its life.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    #[default]
    Healthy,
    Flagged,
}

impl HealthStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthStatus::Healthy => "healthy",
            HealthStatus::Flagged => "flagged",
        }
    }

    pub fn is_flagged(&self) -> bool {
        matches!(self, HealthStatus::Flagged)
    }
}

impl FromStr for HealthStatus {
    type Err = CropError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "healthy" => Ok(HealthStatus::Healthy),
            "flagged" => Ok(HealthStatus::Flagged),
            other => Err(CropError::UnknownHealthStatus(other.to_string())),
        }
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Harvest projection and health state of one assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlantHealth {
    /// Snapshot taken at assignment time; later life cycle edits do not move it.
    pub harvest_date: DateTime<Utc>,
    status: HealthStatus,
}

impl PlantHealth {
    pub fn new(harvest_date: DateTime<Utc>) -> Self {
        Self {
            harvest_date,
            status: HealthStatus::Healthy,
        }
    }

    /// Rebuilds a health record loaded from storage.
    pub fn restore(harvest_date: DateTime<Utc>, status: HealthStatus) -> Self {
        Self { harvest_date, status }
    }

    pub fn status(&self) -> HealthStatus {
        self.status
    }

    pub fn is_dead(&self) -> bool {
        self.status.is_flagged()
    }

    /// Marks the assignment as flagged. Returns true if this call changed it.
    pub fn flag(&mut self) -> bool {
        let changed = !self.status.is_flagged();
        self.status = HealthStatus::Flagged;
        changed
    }
}

impl Serialize for PlantHealth {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Wire<'a> {
            harvest_date: &'a DateTime<Utc>,
            #[serde(rename = "isDead")]
            is_dead: bool,
            status: HealthStatus,
        }

        Wire {
            harvest_date: &self.harvest_date,
            is_dead: self.is_dead(),
            status: self.status,
        }
        .serialize(serializer)
    }
}

/// A plant growing at a farm.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlantAssignment {
    /// Reference to a [`Plant`]; may dangle after the plant is deleted.
    pub plant_id: String,
    pub plant_count: u32,
    pub plant_health: PlantHealth,
}

impl PlantAssignment {
    /// A healthy planting of `plant_count` units of `plant` made at `planted_at`.
    pub fn new(plant: &Plant, plant_count: u32, planted_at: DateTime<Utc>) -> Result<Self, CropError> {
        Ok(Self {
            plant_id: plant.id.clone(),
            plant_count,
            plant_health: PlantHealth::new(plant.harvest_date_from(planted_at)?),
        })
    }
}

/// A physical site identified by the serial number of its camera device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Farm {
    pub id: String,
    #[serde(rename = "serialNumber")]
    pub serial_number: String,
    pub name: String,
    pub owner_id: String,
    /// Assignments in insertion order.
    pub plants: Vec<PlantAssignment>,
}

impl Farm {
    pub fn new(
        id: impl Into<String>,
        serial_number: impl Into<String>,
        name: impl Into<String>,
        owner_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            serial_number: serial_number.into(),
            name: name.into(),
            owner_id: owner_id.into(),
            plants: Vec::new(),
        }
    }

    /// Appends a new assignment of `plant`, planted at `now`.
    ///
    /// Re-assigning a plant that is already present adds a second entry.
    pub fn assign(
        &mut self,
        plant: &Plant,
        plant_count: u32,
        now: DateTime<Utc>,
    ) -> Result<&PlantAssignment, CropError> {
        self.plants.push(PlantAssignment::new(plant, plant_count, now)?);
        Ok(&self.plants[self.plants.len() - 1])
    }
}

/// An assignment with its plant reference expanded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAssignment {
    pub assignment: PlantAssignment,
    /// `None` when the referenced plant no longer exists.
    pub plant: Option<Plant>,
}

/// A farm with every plant reference expanded, in storage order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedFarm {
    pub id: String,
    pub serial_number: String,
    pub name: String,
    pub owner_id: String,
    pub plants: Vec<ResolvedAssignment>,
}

impl ResolvedFarm {
    /// Assignments whose plant still exists. Dangling references are skipped.
    pub fn live(&self) -> impl Iterator<Item = (&PlantAssignment, &Plant)> + '_ {
        self.plants
            .iter()
            .filter_map(|r| r.plant.as_ref().map(|plant| (&r.assignment, plant)))
    }

    /// First assignment whose plant has exactly this name.
    pub fn find_by_plant_name(&self, name: &str) -> Option<(&PlantAssignment, &Plant)> {
        self.live().find(|(_, plant)| plant.name == name)
    }

    pub fn dangling_count(&self) -> usize {
        self.plants.iter().filter(|r| r.plant.is_none()).count()
    }
}
