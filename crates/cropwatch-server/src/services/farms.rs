//! Farm registration and farm–plant association service.

use chrono::{DateTime, Utc};
use cropwatch_core::{CropError, Farm, PlantAssignment, ResolvedFarm};
use cropwatch_store::StoreError;
use tracing::{info, warn};

use crate::auth::AuthUser;
use crate::dto::{
    AddPlantToFarmRequest, FarmPlantDetail, FarmPlantSummary, HarvestDateInfo, RegisterFarmRequest,
    UserFarmInfo, UserFarmPlant,
};
use crate::error::AppError;
use crate::ServerState;

const FARM_NOT_FOUND: &str = "Farm not found.";

pub fn register_farm(state: &ServerState, user: &AuthUser, req: &RegisterFarmRequest) -> Result<Farm, AppError> {
    let serial = req.serial_number.trim();
    let farm = state
        .store
        .create_farm(serial, req.name.trim(), &user.id)
        .map_err(|e| match e {
            StoreError::DuplicateSerial(s) => AppError::Conflict(format!("Farm {} is already registered.", s)),
            other => AppError::logged("Failed to register farm.", other),
        })?;
    info!(farm_id = %farm.id, serial = %farm.serial_number, owner = %user.id, "Farm registered");
    Ok(farm)
}

/// Appends an assignment of the named plant to the farm, harvest date `now + life_cycle`.
///
/// Returns the farm as stored after the append, including assignments added
/// by concurrent requests.
pub fn add_plant_to_farm(
    state: &ServerState,
    req: &AddPlantToFarmRequest,
    now: DateTime<Utc>,
) -> Result<Farm, AppError> {
    const FAILED: &str = "Failed to add plant to farm.";

    let farm = state
        .store
        .find_farm_by_serial(&req.serial_number)
        .map_err(|e| AppError::logged(FAILED, e))?
        .ok_or_else(|| AppError::NotFound(FARM_NOT_FOUND.into()))?;

    let plant = state
        .store
        .find_plant_by_name(&req.plant_name)
        .map_err(|e| AppError::logged(FAILED, e))?
        .ok_or_else(|| AppError::NotFound("Plant not found.".into()))?;

    let assignment = PlantAssignment::new(&plant, req.plant_count, now).map_err(|e| match e {
        CropError::HarvestDateOutOfRange(days) => {
            AppError::BadRequest(format!("life_cycle of {} days puts the harvest date out of range.", days))
        }
        other => AppError::logged(FAILED, other),
    })?;

    state
        .store
        .append_assignment(&farm.id, &assignment)
        .map_err(|e| AppError::logged(FAILED, e))?;

    info!(
        serial = %farm.serial_number,
        plant = %plant.name,
        plant_count = req.plant_count,
        harvest_date = %assignment.plant_health.harvest_date,
        "Plant added to farm"
    );

    state
        .store
        .find_farm_by_serial(&farm.serial_number)
        .map_err(|e| AppError::logged(FAILED, e))?
        .ok_or_else(|| AppError::NotFound(FARM_NOT_FOUND.into()))
}

fn resolve(state: &ServerState, serial_number: &str, failed: &str) -> Result<ResolvedFarm, AppError> {
    let farm = state
        .store
        .resolve_farm(serial_number)
        .map_err(|e| AppError::logged(failed, e))?
        .ok_or_else(|| AppError::NotFound(FARM_NOT_FOUND.into()))?;

    let dangling = farm.dangling_count();
    if dangling > 0 {
        warn!(serial = %farm.serial_number, dangling, "Farm references deleted plants");
    }
    Ok(farm)
}

pub fn find_plant_in_farm(state: &ServerState, serial_number: &str, plant_name: &str) -> Result<FarmPlantDetail, AppError> {
    let farm = resolve(state, serial_number, "Failed to get plant.")?;
    let (assignment, plant) = farm
        .find_by_plant_name(plant_name)
        .ok_or_else(|| AppError::NotFound("Plant not found in the farm.".into()))?;

    Ok(FarmPlantDetail {
        name: plant.name.clone(),
        life_cycle: plant.life_cycle,
        plant_count: assignment.plant_count,
        harvest_date: assignment.plant_health.harvest_date,
    })
}

/// One entry per assignment in storage order, duplicates included.
///
/// Assignments whose plant has since been deleted are left out, so the list
/// can be shorter than the farm's assignment count.
pub fn list_farm_plants(state: &ServerState, serial_number: &str) -> Result<Vec<FarmPlantSummary>, AppError> {
    let farm = resolve(state, serial_number, "Failed to get plants.")?;
    Ok(farm
        .live()
        .map(|(assignment, plant)| FarmPlantSummary {
            name: plant.name.clone(),
            plant_count: assignment.plant_count,
            harvest_date: assignment.plant_health.harvest_date,
        })
        .collect())
}

/// Plant names and harvest dates in storage order. Like [`list_farm_plants`],
/// assignments of deleted plants are left out.
pub fn list_harvest_dates(state: &ServerState, serial_number: &str) -> Result<Vec<HarvestDateInfo>, AppError> {
    let farm = resolve(state, serial_number, "Failed to get plants and harvest dates.")?;
    Ok(farm
        .live()
        .map(|(assignment, plant)| HarvestDateInfo {
            name: plant.name.clone(),
            harvest_date: assignment.plant_health.harvest_date,
        })
        .collect())
}

/// Every farm owned by the caller, with plant names and counts.
///
/// Assignments of deleted plants are left out of each farm's list.
pub fn farms_for_user(state: &ServerState, user: &AuthUser) -> Result<Vec<UserFarmInfo>, AppError> {
    let farms = state
        .store
        .resolve_farms_by_owner(&user.id)
        .map_err(|e| AppError::logged("Failed to get farms data of the user.", e))?;

    Ok(farms
        .iter()
        .map(|farm| UserFarmInfo {
            serial_number: farm.serial_number.clone(),
            plants: farm
                .live()
                .map(|(assignment, plant)| UserFarmPlant {
                    name: plant.name.clone(),
                    plant_count: assignment.plant_count,
                })
                .collect(),
        })
        .collect())
}
