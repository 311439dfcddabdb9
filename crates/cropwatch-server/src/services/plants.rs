//! Plant CRUD service.

use cropwatch_core::Plant;
use tracing::info;

use crate::dto::{AddPlantRequest, PlantNameInfo, UpdatePlantRequest};
use crate::error::AppError;
use crate::ServerState;

const PLANT_NOT_FOUND: &str = "Plant not found.";

pub fn add_plant(state: &ServerState, req: &AddPlantRequest) -> Result<Plant, AppError> {
    let plant = state
        .store
        .create_plant(req.name.trim(), req.life_cycle)
        .map_err(|e| AppError::logged("Failed to add plant.", e))?;
    info!(plant_id = %plant.id, name = %plant.name, life_cycle = plant.life_cycle, "Plant added");
    Ok(plant)
}

pub fn get_plant(state: &ServerState, id: &str) -> Result<Plant, AppError> {
    state
        .store
        .get_plant(id)
        .map_err(|e| AppError::logged("Failed to get plant.", e))?
        .ok_or_else(|| AppError::NotFound(PLANT_NOT_FOUND.into()))
}

/// Applies a partial update. Existing farm assignments keep their harvest dates.
pub fn update_plant(state: &ServerState, id: &str, req: &UpdatePlantRequest) -> Result<Plant, AppError> {
    let plant = state
        .store
        .update_plant(id, req.name.as_deref().map(str::trim), req.life_cycle)
        .map_err(|e| AppError::logged("Failed to update plant.", e))?
        .ok_or_else(|| AppError::NotFound(PLANT_NOT_FOUND.into()))?;
    info!(plant_id = %plant.id, "Plant updated");
    Ok(plant)
}

/// Deletes a plant. Farms that reference it are not touched.
pub fn delete_plant(state: &ServerState, id: &str) -> Result<(), AppError> {
    let deleted = state
        .store
        .delete_plant(id)
        .map_err(|e| AppError::logged("Failed to delete plant.", e))?;
    if !deleted {
        return Err(AppError::NotFound(PLANT_NOT_FOUND.into()));
    }
    info!(plant_id = %id, "Plant deleted");
    Ok(())
}

pub fn list_plant_names(state: &ServerState) -> Result<Vec<PlantNameInfo>, AppError> {
    let names = state
        .store
        .list_plant_names()
        .map_err(|e| AppError::logged("Failed to get plant names.", e))?;
    Ok(names
        .into_iter()
        .map(|p| PlantNameInfo { id: p.id, name: p.name })
        .collect())
}
