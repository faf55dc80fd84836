//! Job API handlers
//!
//! Thin handlers over the [`Orchestrator`]: generation endpoints answer
//! `202 Accepted` with a ticket, status endpoints read snapshots.

use crate::error::AppError;
use crate::orchestrator::{GenerationRequest, JobTicket, Orchestrator};
use crate::providers::TaskPoll;
use crate::state::{Job, JobFailure, JobKind, JobResult, JobStatus, Project, ProviderKind};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

/// Job status as exposed to clients
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobResponse {
    /// Job id
    pub job_id: String,
    /// Owning project
    pub project_id: String,
    /// What the job generates
    pub kind: JobKind,
    /// Backend serving the job
    pub provider: ProviderKind,
    /// Lifecycle state
    pub status: JobStatus,
    /// Present once done
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<JobResult>,
    /// `data:` URL of an image result, ready for an `<img>` tag
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_url: Option<String>,
    /// Present once failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JobFailure>,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Start time
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    /// Completion time
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
}

impl From<Job> for JobResponse {
    fn from(job: Job) -> Self {
        let data_url = match &job.result {
            Some(JobResult::Image { image }) => Some(image.data_url()),
            _ => None,
        };
        Self {
            job_id: job.job_id,
            project_id: job.project_id,
            kind: job.kind,
            provider: job.provider,
            status: job.status,
            result: job.result,
            data_url,
            error: job.error,
            created_at: job.created_at,
            started_at: job.started_at,
            finished_at: job.finished_at,
        }
    }
}

/// Project with the ids of its jobs
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectResponse {
    /// Project fields
    #[serde(flatten)]
    pub project: Project,
    /// Job ids, oldest first
    pub job_ids: Vec<String>,
}

type Accepted = (StatusCode, Json<JobTicket>);

fn accept(
    orchestrator: &Arc<Orchestrator>,
    kind: JobKind,
    request: GenerationRequest,
) -> Result<Accepted, AppError> {
    let ticket = orchestrator.submit(kind, request)?;
    Ok((StatusCode::ACCEPTED, Json(ticket)))
}

/// POST /api/analyze - Describe a product image
///
/// Needs `imageUrl` or a project that already has an image.
pub async fn analyze(
    State(orchestrator): State<Arc<Orchestrator>>,
    Json(request): Json<GenerationRequest>,
) -> Result<Accepted, AppError> {
    accept(&orchestrator, JobKind::Analyze, request)
}

/// POST /api/generate-image - Generate an ad image
///
/// The finished image becomes the project's derived asset.
///
/// # Arguments
/// * `State(orchestrator)` - Shared orchestrator
/// * `Json(request)` - `prompt` (required), optional `projectId`, `imageUrl`, `context`
///
/// # Returns
/// * `Ok((202, ticket))` - Job accepted
/// * `Err(AppError)` - Validation failed, no job was created
pub async fn generate_image(
    State(orchestrator): State<Arc<Orchestrator>>,
    Json(request): Json<GenerationRequest>,
) -> Result<Accepted, AppError> {
    accept(&orchestrator, JobKind::GenerateImage, request)
}

/// POST /api/generate-landing-section - Generate landing page copy as JSON
pub async fn generate_landing_section(
    State(orchestrator): State<Arc<Orchestrator>>,
    Json(request): Json<GenerationRequest>,
) -> Result<Accepted, AppError> {
    accept(&orchestrator, JobKind::GenerateLandingSection, request)
}

/// POST /api/generate-video - Submit an image-to-video task
///
/// The job finishes once the provider accepted the task; the clip itself is
/// followed through `GET /api/video/:task_id`.
pub async fn generate_video(
    State(orchestrator): State<Arc<Orchestrator>>,
    Json(request): Json<GenerationRequest>,
) -> Result<Accepted, AppError> {
    accept(&orchestrator, JobKind::GenerateVideo, request)
}

/// GET /api/job/:job_id
pub async fn get_job(
    State(orchestrator): State<Arc<Orchestrator>>,
    Path(job_id): Path<String>,
) -> Result<Json<JobResponse>, AppError> {
    let job = orchestrator.get_job(&job_id)?;
    Ok(Json(job.into()))
}

/// GET /api/project/:project_id
pub async fn get_project(
    State(orchestrator): State<Arc<Orchestrator>>,
    Path(project_id): Path<String>,
) -> Result<Json<ProjectResponse>, AppError> {
    let project = orchestrator.get_project(&project_id)?;
    let job_ids = orchestrator
        .project_jobs(&project_id)?
        .into_iter()
        .map(|j| j.job_id)
        .collect();
    Ok(Json(ProjectResponse { project, job_ids }))
}

/// GET /api/video/:task_id - Provider task status pass-through
pub async fn poll_video(
    State(orchestrator): State<Arc<Orchestrator>>,
    Path(task_id): Path<String>,
) -> Result<Json<TaskPoll>, AppError> {
    let poll = orchestrator.poll_video(&task_id).await?;
    Ok(Json(poll))
}
