//! Shared fixtures for unit and router tests.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use cropwatch_core::Prediction;
use cropwatch_store::FarmStore;
use cropwatch_vision::{PredictionSource, VisionError};
use jsonwebtoken::{encode, EncodingKey, Header};

use crate::auth::{Claims, TokenVerifier};
use crate::ServerState;

pub const TEST_SECRET: &str = "cropwatch-test-secret";

/// Signs a token for `user` valid for one hour.
pub fn issue_token(user: &str) -> String {
    let claims = Claims {
        sub: user.to_string(),
        exp: (Utc::now().timestamp() + 3600) as u64,
    };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(TEST_SECRET.as_bytes())).unwrap()
}

/// Serves a fixed prediction list.
pub struct FakePredictions(pub Vec<Prediction>);

#[async_trait]
impl PredictionSource for FakePredictions {
    async fn fetch_predictions(&self) -> Result<Vec<Prediction>, VisionError> {
        Ok(self.0.clone())
    }
}

/// Always fails as if the camera service were down.
pub struct FailingPredictions;

#[async_trait]
impl PredictionSource for FailingPredictions {
    async fn fetch_predictions(&self) -> Result<Vec<Prediction>, VisionError> {
        Err(VisionError::Request("connection refused".into()))
    }
}

pub fn test_state_with_source(predictions: Arc<dyn PredictionSource>) -> ServerState {
    ServerState {
        store: FarmStore::in_memory().unwrap(),
        predictions,
        tokens: TokenVerifier::new(TEST_SECRET),
    }
}

pub fn test_state(predictions: Vec<Prediction>) -> ServerState {
    test_state_with_source(Arc::new(FakePredictions(predictions)))
}
