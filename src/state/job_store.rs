//! Job registry
//!
//! Each job is its own DashMap entry; a transition locks only that entry's
//! shard for the duration of the check-and-apply.

use crate::error::AppError;
use crate::state::models::{Job, JobId, JobKind, JobRequest, JobTransition, ProviderKind};
use dashmap::DashMap;
use tracing::debug;

/// Registry of jobs
#[derive(Debug, Default)]
pub struct JobStore {
    jobs: DashMap<JobId, Job>,
}

impl JobStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a pending job and return a snapshot of it
    pub fn create(
        &self,
        kind: JobKind,
        project_id: &str,
        provider: ProviderKind,
        request: JobRequest,
    ) -> Job {
        let job = Job::new(kind, project_id.to_string(), provider, request);
        debug!(
            job_id = %job.job_id,
            project_id = %project_id,
            kind = %kind,
            provider = %provider,
            "Job created"
        );
        self.jobs.insert(job.job_id.clone(), job.clone());
        job
    }

    /// Move a job along its lifecycle
    ///
    /// Fails with `InvalidTransition` (leaving the stored job untouched) when
    /// the move is not allowed, and with `NotFound` for unknown ids.
    pub fn transition(&self, job_id: &str, transition: JobTransition) -> Result<Job, AppError> {
        let mut job = self
            .jobs
            .get_mut(job_id)
            .ok_or_else(|| AppError::NotFound(format!("job {}", job_id)))?;
        job.apply(transition)?;
        debug!(job_id = %job_id, status = %job.status, "Job transitioned");
        Ok(job.clone())
    }

    /// Get a snapshot of a job
    pub fn get(&self, job_id: &str) -> Result<Job, AppError> {
        self.jobs
            .get(job_id)
            .map(|j| j.clone())
            .ok_or_else(|| AppError::NotFound(format!("job {}", job_id)))
    }

    /// Jobs of one project, oldest first
    pub fn list_for_project(&self, project_id: &str) -> Vec<Job> {
        let mut jobs: Vec<Job> = self
            .jobs
            .iter()
            .filter(|j| j.project_id == project_id)
            .map(|j| j.clone())
            .collect();
        jobs.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        jobs
    }

    /// Number of jobs
    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    /// Whether the store is empty
    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}
