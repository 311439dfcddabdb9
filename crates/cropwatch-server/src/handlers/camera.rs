//! Camera health-check trigger.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use tracing::info;

use crate::dto::HealthCheckResponse;
use crate::error::AppError;
use crate::services::health_check;
use crate::ServerState;

/// POST /health-check/camera - Flag farms the cameras report as unhealthy.
pub async fn check(State(state): State<Arc<ServerState>>) -> Result<Json<HealthCheckResponse>, AppError> {
    info!("Running camera health check");
    let flagged_farms = health_check::check_plant_health(&state).await?;
    Ok(Json(HealthCheckResponse {
        message: "Plant health checked successfully".into(),
        flagged_farms,
    }))
}
