//! API module
//!
//! HTTP request handlers and the route table.

pub mod health;
pub mod jobs;

use crate::orchestrator::Orchestrator;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

/// Route table of the gateway
pub fn router(orchestrator: Arc<Orchestrator>) -> Router {
    Router::new()
        .route("/", get(health::hello))
        .route("/api/health", get(health::health_check))
        // Generation (202 + job ticket)
        .route("/api/analyze", post(jobs::analyze))
        .route("/api/generate-image", post(jobs::generate_image))
        .route(
            "/api/generate-landing-section",
            post(jobs::generate_landing_section),
        )
        .route("/api/generate-video", post(jobs::generate_video))
        // Status
        .route("/api/job/:job_id", get(jobs::get_job))
        .route("/api/project/:project_id", get(jobs::get_project))
        .route("/api/video/:task_id", get(jobs::poll_video))
        .with_state(orchestrator)
}
