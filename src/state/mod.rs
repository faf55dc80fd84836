// State management module
// Projects, jobs and the in-memory registries that hold them

pub mod job_store;
pub mod models;
pub mod project_store;

pub use job_store::JobStore;
pub use models::{
    ImageData, Job, JobFailure, JobId, JobKind, JobRequest, JobResult, JobStatus, JobTransition,
    Project, ProjectId, ProviderKind, VideoParams, DEFAULT_PROJECT_ID,
};
pub use project_store::ProjectStore;
