//! Farm and farm-plant HTTP handlers.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use cropwatch_core::Farm;

use crate::auth::AuthUser;
use crate::dto::{
    AddPlantToFarmRequest, FarmPlantDetail, FarmPlantQuery, FarmPlantSummary, FarmQuery, HarvestDateInfo,
    RegisterFarmRequest, UserFarmInfo,
};
use crate::error::AppError;
use crate::extract::AppJson;
use crate::services::farms as farm_service;
use crate::ServerState;

/// POST /farms - Register a farm owned by the caller.
pub async fn register(
    State(state): State<Arc<ServerState>>,
    user: AuthUser,
    AppJson(req): AppJson<RegisterFarmRequest>,
) -> Result<(StatusCode, Json<Farm>), AppError> {
    req.validate()?;
    let farm = farm_service::register_farm(&state, &user, &req)?;
    Ok((StatusCode::CREATED, Json(farm)))
}

/// GET /farms/mine
pub async fn mine(
    State(state): State<Arc<ServerState>>,
    user: AuthUser,
) -> Result<Json<Vec<UserFarmInfo>>, AppError> {
    farm_service::farms_for_user(&state, &user).map(Json)
}

/// POST /farms/plants - Plant a crop on a farm.
pub async fn add_plant(
    State(state): State<Arc<ServerState>>,
    _user: AuthUser,
    AppJson(req): AppJson<AddPlantToFarmRequest>,
) -> Result<Json<Farm>, AppError> {
    req.validate()?;
    farm_service::add_plant_to_farm(&state, &req, Utc::now()).map(Json)
}

pub async fn find_plant(
    State(state): State<Arc<ServerState>>,
    _user: AuthUser,
    AppJson(req): AppJson<FarmPlantQuery>,
) -> Result<Json<FarmPlantDetail>, AppError> {
    farm_service::find_plant_in_farm(&state, &req.serial_number, &req.plant_name).map(Json)
}

pub async fn list_plants(
    State(state): State<Arc<ServerState>>,
    _user: AuthUser,
    AppJson(req): AppJson<FarmQuery>,
) -> Result<Json<Vec<FarmPlantSummary>>, AppError> {
    farm_service::list_farm_plants(&state, &req.serial_number).map(Json)
}

pub async fn harvest_dates(
    State(state): State<Arc<ServerState>>,
    _user: AuthUser,
    AppJson(req): AppJson<FarmQuery>,
) -> Result<Json<Vec<HarvestDateInfo>>, AppError> {
    farm_service::list_harvest_dates(&state, &req.serial_number).map(Json)
}
