//! Camera predictions and latest-per-device reduction.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Label the camera service reports for a healthy crop. Anything else flags the farm.
pub const HEALTHY_LABEL: &str = "healthy";

/// A health classification for one camera device at a point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prediction {
    /// Camera device identifier; equals the farm's serial number.
    pub device_id: String,
    pub prediction: String,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub created_at: DateTime<Utc>,
}

impl Prediction {
    pub fn is_healthy(&self) -> bool {
        self.prediction == HEALTHY_LABEL
    }
}

/// Keeps the most recent prediction for each device.
///
/// A record replaces the current one only when its `created_at` is strictly
/// later, so on equal timestamps the first record seen wins.
pub fn latest_by_device(predictions: impl IntoIterator<Item = Prediction>) -> HashMap<String, Prediction> {
    let mut latest: HashMap<String, Prediction> = HashMap::new();
    for prediction in predictions {
        match latest.entry(prediction.device_id.clone()) {
            Entry::Vacant(slot) => {
                slot.insert(prediction);
            }
            Entry::Occupied(mut slot) => {
                if prediction.created_at > slot.get().created_at {
                    slot.insert(prediction);
                }
            }
        }
    }
    latest
}

/// Accepts RFC 3339 timestamps, and zone-less ISO timestamps read as UTC.
fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    if let Ok(ts) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|e| serde::de::Error::custom(format!("invalid created_at {raw:?}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn prediction(device: &str, label: &str, hour: u32) -> Prediction {
        Prediction {
            device_id: device.to_string(),
            prediction: label.to_string(),
            created_at: Utc.with_ymd_and_hms(2024, 5, 1, hour, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_latest_prediction_wins() {
        let latest = latest_by_device(vec![
            prediction("d1", "healthy", 8),
            prediction("d1", "sick", 9),
            prediction("d2", "sick", 10),
            prediction("d2", "healthy", 11),
        ]);

        assert_eq!(latest.len(), 2);
        assert_eq!(latest["d1"].prediction, "sick");
        assert_eq!(latest["d2"].prediction, "healthy");
    }

    #[test]
    fn test_older_record_after_newer_is_ignored() {
        let latest = latest_by_device(vec![prediction("d1", "sick", 9), prediction("d1", "healthy", 8)]);
        assert_eq!(latest["d1"].prediction, "sick");
    }

    #[test]
    fn test_equal_timestamps_keep_first_seen() {
        let latest = latest_by_device(vec![prediction("d1", "healthy", 8), prediction("d1", "sick", 8)]);
        assert_eq!(latest["d1"].prediction, "healthy");

        let latest = latest_by_device(vec![prediction("d1", "sick", 8), prediction("d1", "healthy", 8)]);
        assert_eq!(latest["d1"].prediction, "sick");
    }

    #[test]
    fn test_only_exact_healthy_label_is_healthy() {
        assert!(prediction("d1", "healthy", 8).is_healthy());
        assert!(!prediction("d1", "Healthy", 8).is_healthy());
        assert!(!prediction("d1", "", 8).is_healthy());
    }

    #[test]
    fn test_deserialize_accepts_zoned_and_naive_timestamps() {
        let json = r#"[
            {"device_id": "d1", "prediction": "healthy", "created_at": "2024-05-01T08:00:00Z"},
            {"device_id": "d2", "prediction": "sick", "created_at": "2024-05-01T10:30:00+02:00"},
            {"device_id": "d3", "prediction": "sick", "created_at": "2024-05-01T08:00:00.123456"}
        ]"#;
        let parsed: Vec<Prediction> = serde_json::from_str(json).unwrap();

        assert_eq!(parsed[0].created_at, Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap());
        assert_eq!(parsed[1].created_at, Utc.with_ymd_and_hms(2024, 5, 1, 8, 30, 0).unwrap());
        assert_eq!(parsed[2].created_at.timestamp(), parsed[0].created_at.timestamp());
    }

    #[test]
    fn test_deserialize_rejects_garbage_timestamp() {
        let json = r#"{"device_id": "d1", "prediction": "healthy", "created_at": "yesterday"}"#;
        assert!(serde_json::from_str::<Prediction>(json).is_err());
    }
}
