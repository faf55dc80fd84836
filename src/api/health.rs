//! Liveness endpoints

use crate::orchestrator::Orchestrator;
use crate::state::ProviderKind;
use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;

/// Body of `GET /`
#[derive(Serialize)]
pub struct HelloResponse {
    /// Always `ok`
    pub status: String,
    /// Banner
    pub message: String,
}

/// Body of `GET /api/health`
#[derive(Serialize)]
pub struct HealthResponse {
    /// Always `healthy`
    pub status: String,
    /// Crate version
    pub version: String,
    /// Providers that have credentials
    pub providers: Vec<ProviderKind>,
    /// Jobs tracked since startup
    pub jobs: usize,
    /// Projects tracked since startup
    pub projects: usize,
}

/// GET /
pub async fn hello() -> Json<HelloResponse> {
    Json(HelloResponse {
        status: "ok".to_string(),
        message: "CCREATY backend activo 🚀".to_string(),
    })
}

/// GET /api/health
pub async fn health_check(State(orchestrator): State<Arc<Orchestrator>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        providers: orchestrator.providers().configured(),
        jobs: orchestrator.jobs().len(),
        projects: orchestrator.projects().len(),
    })
}
