//! Plant CRUD HTTP handlers.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use cropwatch_core::Plant;

use crate::auth::AuthUser;
use crate::dto::{AddPlantRequest, MessageResponse, PlantNameInfo, UpdatePlantRequest};
use crate::error::AppError;
use crate::extract::AppJson;
use crate::services::plants as plant_service;
use crate::ServerState;

/// POST /plants - Create a plant.
pub async fn add(
    State(state): State<Arc<ServerState>>,
    _user: AuthUser,
    AppJson(req): AppJson<AddPlantRequest>,
) -> Result<(StatusCode, Json<Plant>), AppError> {
    req.validate()?;
    let plant = plant_service::add_plant(&state, &req)?;
    Ok((StatusCode::CREATED, Json(plant)))
}

/// GET /plants/{id}
pub async fn get(
    State(state): State<Arc<ServerState>>,
    _user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Plant>, AppError> {
    plant_service::get_plant(&state, &id).map(Json)
}

/// PUT /plants/{id} - Partial update.
pub async fn update(
    State(state): State<Arc<ServerState>>,
    _user: AuthUser,
    Path(id): Path<String>,
    AppJson(req): AppJson<UpdatePlantRequest>,
) -> Result<Json<Plant>, AppError> {
    req.validate()?;
    plant_service::update_plant(&state, &id, &req).map(Json)
}

/// DELETE /plants/{id}
pub async fn delete(
    State(state): State<Arc<ServerState>>,
    _user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    plant_service::delete_plant(&state, &id)?;
    Ok(Json(MessageResponse::new("Plant deleted successfully.")))
}

/// GET /plants/names
pub async fn names(
    State(state): State<Arc<ServerState>>,
    _user: AuthUser,
) -> Result<Json<Vec<PlantNameInfo>>, AppError> {
    plant_service::list_plant_names(&state).map(Json)
}
