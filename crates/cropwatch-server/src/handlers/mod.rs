//! HTTP route handlers for the cropwatch server.

pub mod camera;
pub mod farms;
pub mod plants;

/// Health check endpoint.
pub async fn health() -> &'static str {
    "OK"
}
