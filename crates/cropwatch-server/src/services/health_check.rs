//! Camera-driven crop health check.
//!
//! Pulls the prediction list, keeps the latest record per device and flags
//! every assignment on farms whose latest label is not healthy. Farms are
//! flagged one at a time in place; a failure part-way leaves earlier farms
//! flagged.

use cropwatch_core::latest_by_device;
use tracing::{debug, info, warn};

use crate::error::AppError;
use crate::ServerState;

const FAILED: &str = "Failed to check plant health.";

/// Returns the serial numbers of every farm whose latest prediction is not healthy.
pub async fn check_plant_health(state: &ServerState) -> Result<Vec<String>, AppError> {
    let predictions = state
        .predictions
        .fetch_predictions()
        .await
        .map_err(|e| AppError::logged(FAILED, e))?;

    let fetched = predictions.len();
    let latest = latest_by_device(predictions);
    debug!(fetched, devices = latest.len(), "Reduced camera predictions");

    let farms = state.store.list_farms().map_err(|e| AppError::logged(FAILED, e))?;

    let mut flagged = Vec::new();
    for farm in farms {
        let Some(prediction) = latest.get(&farm.serial_number) else {
            continue;
        };
        if prediction.is_healthy() {
            continue;
        }

        warn!(
            serial = %farm.serial_number,
            prediction = %prediction.prediction,
            "DANGER: crops on farm flagged by camera"
        );

        let changed = state.store.flag_farm(&farm.id).map_err(|e| AppError::logged(FAILED, e))?;
        debug!(serial = %farm.serial_number, changed, "Flagged assignments");
        flagged.push(farm.serial_number);
    }

    info!(flagged = flagged.len(), "Plant health check complete");
    Ok(flagged)
}
