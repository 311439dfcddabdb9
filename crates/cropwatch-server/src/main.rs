mod auth;
mod dto;
mod error;
mod extract;
mod handlers;
mod services;
#[cfg(test)]
mod test_support;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::body::Body;
use axum::http::{Request, Response};
use axum::routing::{get, post};
use axum::Router;
use cropwatch_config::ServerConfig;
use cropwatch_store::FarmStore;
use cropwatch_vision::{HttpPredictionClient, PredictionSource};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::auth::TokenVerifier;

pub struct ServerState {
    pub store: FarmStore,
    pub predictions: Arc<dyn PredictionSource>,
    pub tokens: TokenVerifier,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .compact()
        .init();

    let config = ServerConfig::from_env().context("Failed to load configuration")?;
    let state = Arc::new(init_server_state(&config)?);

    let addr = config.bind_addr();
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down");
    Ok(())
}

fn init_server_state(config: &ServerConfig) -> Result<ServerState> {
    let store = FarmStore::new(&config.database_path)
        .with_context(|| format!("Failed to open database at {}", config.database_path))?;

    let prediction = &config.prediction;
    let client = HttpPredictionClient::new(&prediction.url, prediction.timeout, prediction.max_retries)
        .context("Failed to build prediction client")?;
    info!(
        url = %prediction.url,
        timeout_secs = prediction.timeout.as_secs(),
        max_retries = prediction.max_retries,
        "Prediction source configured"
    );

    Ok(ServerState {
        store,
        predictions: Arc::new(client),
        tokens: TokenVerifier::new(&config.jwt_secret),
    })
}

fn app(state: Arc<ServerState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|req: &Request<Body>| {
            tracing::info_span!(
                "request",
                method = %req.method(),
                uri = %req.uri(),
                version = ?req.version(),
            )
        })
        .on_response(|res: &Response<Body>, latency: Duration, _span: &tracing::Span| {
            info!(
                latency = %format!("{} ms", latency.as_millis()),
                status = %res.status().as_u16(),
                "finished processing request"
            );
        });

    let logged_routes = Router::new()
        .route("/plants", post(handlers::plants::add))
        .route("/plants/names", get(handlers::plants::names))
        .route(
            "/plants/{id}",
            get(handlers::plants::get)
                .put(handlers::plants::update)
                .delete(handlers::plants::delete),
        )
        .route("/farms", post(handlers::farms::register))
        .route("/farms/mine", get(handlers::farms::mine))
        .route("/farms/plants", post(handlers::farms::add_plant))
        .route("/farms/plants/find", post(handlers::farms::find_plant))
        .route("/farms/plants/list", post(handlers::farms::list_plants))
        .route("/farms/plants/harvest-dates", post(handlers::farms::harvest_dates))
        .route("/health-check/camera", post(handlers::camera::check))
        .layer(trace_layer);

    Router::new()
        .merge(logged_routes)
        .route("/health", get(handlers::health))
        .layer(cors)
        .with_state(state)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;

    use axum::http::{header, Method, StatusCode};
    use chrono::{TimeZone, Utc};
    use cropwatch_core::Prediction;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::test_support::{issue_token, test_state};

    struct TestApp {
        router: Router,
        state: Arc<ServerState>,
    }

    impl TestApp {
        fn new(predictions: Vec<Prediction>) -> Self {
            let state = Arc::new(test_state(predictions));
            Self { router: app(state.clone()), state }
        }

        async fn call(&self, method: Method, uri: &str, user: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
            let mut builder = Request::builder().method(method).uri(uri);
            if let Some(user) = user {
                builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", issue_token(user)));
            }
            let request = match body {
                Some(body) => builder
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
                None => builder.body(Body::empty()).unwrap(),
            };

            let response = self.router.clone().oneshot(request).await.unwrap();
            let status = response.status();
            let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
            let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
            (status, value)
        }
    }

    #[tokio::test]
    async fn test_health_is_public() {
        let app = TestApp::new(vec![]);
        let response = app
            .router
            .clone()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_missing_token_is_unauthorized() {
        let app = TestApp::new(vec![]);
        let (status, body) = app.call(Method::GET, "/plants/names", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, json!({"error": "Missing bearer token."}));
    }

    #[tokio::test]
    async fn test_plant_lifecycle_over_http() {
        let app = TestApp::new(vec![]);

        let (status, created) = app
            .call(Method::POST, "/plants", Some("user-1"), Some(json!({"name": "Tomato", "life_cycle": 60})))
            .await;
        assert_eq!(status, StatusCode::CREATED);
        let id = created["id"].as_str().unwrap().to_string();

        let (status, fetched) = app.call(Method::GET, &format!("/plants/{id}"), Some("user-1"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched["name"], "Tomato");
        assert_eq!(fetched["life_cycle"], 60);

        let (status, _) = app
            .call(Method::PUT, &format!("/plants/{id}"), Some("user-1"), Some(json!({"life_cycle": 65})))
            .await;
        assert_eq!(status, StatusCode::OK);

        let (status, names) = app.call(Method::GET, "/plants/names", Some("user-1"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(names, json!([{"id": id, "name": "Tomato"}]));

        let (status, body) = app.call(Method::DELETE, &format!("/plants/{id}"), Some("user-1"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"message": "Plant deleted successfully."}));

        let (status, _) = app.call(Method::DELETE, &format!("/plants/{id}"), Some("user-1"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_invalid_body_is_rejected() {
        let app = TestApp::new(vec![]);
        let (status, _) = app
            .call(Method::POST, "/plants", Some("user-1"), Some(json!({"name": "Tomato", "life_cycle": -5})))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = app
            .call(Method::POST, "/plants", Some("user-1"), Some(json!({"name": "Tomato"})))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("life_cycle"));

        let (status, body) = app
            .call(Method::POST, "/plants", Some("user-1"), Some(json!({"name": "Tomato", "life_cycle": "sixty"})))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());

        let (status, body) = app.call(Method::POST, "/farms/plants/list", Some("user-1"), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_tomato_scenario() {
        let app = TestApp::new(vec![]);
        app.call(Method::POST, "/farms", Some("user-1"), Some(json!({"serialNumber": "S1"}))).await;
        app.call(Method::POST, "/plants", Some("user-1"), Some(json!({"name": "Tomato", "life_cycle": 60})))
            .await;

        let before = Utc::now();
        let (status, farm) = app
            .call(
                Method::POST,
                "/farms/plants",
                Some("user-1"),
                Some(json!({"serialNumber": "S1", "plantName": "Tomato", "plant_count": 7})),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(farm["serialNumber"], "S1");
        assert_eq!(farm["plants"][0]["plant_health"]["isDead"], false);

        let (status, detail) = app
            .call(
                Method::POST,
                "/farms/plants/find",
                Some("user-1"),
                Some(json!({"serialNumber": "S1", "plantName": "Tomato"})),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(detail["name"], "Tomato");
        assert_eq!(detail["life_cycle"], 60);
        assert_eq!(detail["plant_count"], 7);

        let harvest: chrono::DateTime<Utc> = serde_json::from_value(detail["harvest_date"].clone()).unwrap();
        let expected = before + chrono::Duration::days(60);
        assert!((harvest - expected).num_seconds().abs() < 5);

        let (status, _) = app
            .call(
                Method::POST,
                "/farms/plants/find",
                Some("user-1"),
                Some(json!({"serialNumber": "S1", "plantName": "Basil"})),
            )
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_duplicate_farm_conflicts() {
        let app = TestApp::new(vec![]);
        let (status, _) = app.call(Method::POST, "/farms", Some("user-1"), Some(json!({"serialNumber": "S1"}))).await;
        assert_eq!(status, StatusCode::CREATED);
        let (status, _) = app.call(Method::POST, "/farms", Some("user-2"), Some(json!({"serialNumber": "S1"}))).await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_farm_listing_is_bound_to_caller() {
        let app = TestApp::new(vec![]);
        app.call(Method::POST, "/farms", Some("alice"), Some(json!({"serialNumber": "A1"}))).await;
        app.call(Method::POST, "/farms", Some("bob"), Some(json!({"serialNumber": "B1"}))).await;

        let (status, farms) = app.call(Method::GET, "/farms/mine", Some("alice"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(farms, json!([{"serialNumber": "A1", "plants": []}]));
    }

    #[tokio::test]
    async fn test_camera_health_check_flags_farm() {
        let at = |hour| Utc.with_ymd_and_hms(2024, 6, 1, hour, 0, 0).unwrap();
        let app = TestApp::new(vec![
            Prediction { device_id: "d1".into(), prediction: "healthy".into(), created_at: at(8) },
            Prediction { device_id: "d1".into(), prediction: "sick".into(), created_at: at(9) },
        ]);
        app.call(Method::POST, "/farms", Some("user-1"), Some(json!({"serialNumber": "d1"}))).await;
        app.call(Method::POST, "/plants", Some("user-1"), Some(json!({"name": "Corn", "life_cycle": 90})))
            .await;
        app.call(
            Method::POST,
            "/farms/plants",
            Some("user-1"),
            Some(json!({"serialNumber": "d1", "plantName": "Corn", "plant_count": 40})),
        )
        .await;

        let (status, body) = app.call(Method::POST, "/health-check/camera", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"message": "Plant health checked successfully", "flagged_farms": ["d1"]}));

        let farm = app.state.store.find_farm_by_serial("d1").unwrap().unwrap();
        assert!(farm.plants.iter().all(|p| p.plant_health.is_dead()));
    }
}
