//! Job dispatch
//!
//! The [`Orchestrator`] owns the stores, the provider registry and the
//! token cache. A submission is validated synchronously, then the job runs
//! on its own tokio task while the caller gets a ticket back.

use crate::auth::{AuthError, TokenCache};
use crate::error::AppError;
use crate::orchestrator::config::OrchestratorConfig;
use crate::orchestrator::utils::{hash_prompt, parse_json_output};
use crate::orchestrator::validation::{self, GenerationRequest};
use crate::orchestrator::prompts;
use crate::providers::{
    AuthScheme, GeneratedArtifact, GenerationInput, OutputFormat, ProviderRegistry, TaskPoll,
};
use crate::state::models::{
    Job, JobFailure, JobId, JobKind, JobRequest, JobResult, JobStatus, JobTransition, Project,
    ProjectId,
};
use crate::state::{JobStore, ProjectStore};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error, info, warn, Instrument};

/// What a submission returns to the caller
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobTicket {
    /// Id to query status with
    pub job_id: JobId,
    /// Always `pending` at submission
    pub status: JobStatus,
    /// Project the job belongs to
    pub project_id: ProjectId,
}

/// Coordinates validation, job bookkeeping and provider execution
pub struct Orchestrator {
    projects: ProjectStore,
    jobs: JobStore,
    providers: ProviderRegistry,
    token_cache: Option<Arc<TokenCache>>,
    config: OrchestratorConfig,
}

impl Orchestrator {
    /// Create an orchestrator with empty stores
    ///
    /// `token_cache` is required as soon as one registered provider uses
    /// [`AuthScheme::OAuthBearer`].
    pub fn new(
        providers: ProviderRegistry,
        token_cache: Option<Arc<TokenCache>>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            projects: ProjectStore::new(),
            jobs: JobStore::new(),
            providers,
            token_cache,
            config,
        }
    }

    /// Project registry
    pub fn projects(&self) -> &ProjectStore {
        &self.projects
    }

    /// Job registry
    pub fn jobs(&self) -> &JobStore {
        &self.jobs
    }

    /// Provider registry
    pub fn providers(&self) -> &ProviderRegistry {
        &self.providers
    }

    /// Execution limits
    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Validate a request, create its job and start executing it
    ///
    /// Validation failures (including a missing source image for kinds that
    /// need one, or no provider configured for the kind) are returned here
    /// and create neither a job nor a project.
    pub fn submit(
        self: &Arc<Self>,
        kind: JobKind,
        request: GenerationRequest,
    ) -> Result<JobTicket, AppError> {
        let validated = validation::validate(kind, &request, &self.config)?;
        let provider = self.providers.route(kind)?;

        let existing = self.projects.get(&validated.project_id).ok();
        let source_image = validated
            .image_url
            .clone()
            .or_else(|| existing.as_ref().and_then(|p| p.latest_image().map(str::to_string)));

        if kind.requires_source_image() && source_image.is_none() {
            return Err(AppError::Validation(format!(
                "{} jobs need an image: pass imageUrl or generate one in project '{}' first",
                kind, validated.project_id
            )));
        }

        let project = self
            .projects
            .get_or_create(&validated.project_id, validated.image_url.clone());

        let prompt = prompts::compose(
            kind,
            validated.prompt.as_deref(),
            validated.section.as_deref(),
            validated.context.as_deref(),
        );
        let job_request = JobRequest {
            prompt,
            source_image,
            section: validated.section,
            video: validated.video,
            context: validated.context,
        };

        let job = self
            .jobs
            .create(kind, &project.project_id, provider, job_request);

        info!(
            job_id = %job.job_id,
            project_id = %job.project_id,
            kind = %kind,
            provider = %provider,
            prompt_hash = %hash_prompt(&job.request.prompt),
            "Job submitted"
        );

        let ticket = JobTicket {
            job_id: job.job_id.clone(),
            status: job.status,
            project_id: job.project_id.clone(),
        };

        let span = tracing::info_span!(
            "job",
            job_id = %job.job_id,
            kind = %kind,
            provider = %provider,
        );
        tokio::spawn(Arc::clone(self).run_job(job).instrument(span));

        Ok(ticket)
    }

    /// Snapshot of a job
    pub fn get_job(&self, job_id: &str) -> Result<Job, AppError> {
        self.jobs.get(job_id)
    }

    /// Snapshot of a project
    pub fn get_project(&self, project_id: &str) -> Result<Project, AppError> {
        self.projects.get(project_id)
    }

    /// Jobs of a project, oldest first
    pub fn project_jobs(&self, project_id: &str) -> Result<Vec<Job>, AppError> {
        self.projects.get(project_id)?;
        Ok(self.jobs.list_for_project(project_id))
    }

    /// Read the state of a video task straight from the provider
    pub async fn poll_video(&self, task_id: &str) -> Result<TaskPoll, AppError> {
        let task_id = task_id.trim();
        if task_id.is_empty()
            || !task_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(AppError::Validation(format!("invalid task id '{}'", task_id)));
        }

        let generator = self.providers.video_generator()?;
        let timeout = self.config.provider_timeout();
        let poll = async {
            let bearer = self.credential(generator.auth_scheme()).await?;
            generator.poll(task_id, bearer.as_deref()).await
        };
        match tokio::time::timeout(timeout, poll).await {
            Ok(result) => result,
            Err(_) => Err(self.timeout_error()),
        }
    }

    async fn run_job(self: Arc<Self>, job: Job) {
        if let Err(e) = self.jobs.transition(&job.job_id, JobTransition::Start) {
            error!(error = %e, "Job could not start");
            return;
        }
        debug!("Job running");

        // Provider work runs on its own task so a panic there still ends the job.
        let mut worker = {
            let this = Arc::clone(&self);
            let job = job.clone();
            tokio::spawn(async move { this.execute(&job).await }.in_current_span())
        };

        let outcome = match tokio::time::timeout(self.config.provider_timeout(), &mut worker).await
        {
            Ok(Ok(result)) => result,
            Ok(Err(join_error)) => Err(worker_failure(join_error)),
            Err(_) => {
                worker.abort();
                Err(self.timeout_error())
            }
        };

        let transition = match outcome {
            Ok(result) => {
                if job.kind.produces_reusable_asset() {
                    if let JobResult::Image { image } = &result {
                        if let Err(e) = self
                            .projects
                            .set_derived_asset(&job.project_id, image.data_url())
                        {
                            warn!(error = %e, "Derived asset not recorded");
                        }
                    }
                }
                info!("Job done");
                JobTransition::Complete(result)
            }
            Err(err) => {
                if matches!(err, AppError::Auth(AuthError::CredentialRejected(_))) {
                    if let Some(cache) = &self.token_cache {
                        cache.invalidate().await;
                    }
                }
                warn!(error = %err, kind = ?err.kind(), "Job failed");
                JobTransition::Fail(JobFailure::from(&err))
            }
        };

        if let Err(e) = self.jobs.transition(&job.job_id, transition) {
            error!(error = %e, "Job outcome not recorded");
        }
    }

    async fn execute(&self, job: &Job) -> Result<JobResult, AppError> {
        let request = &job.request;

        if job.kind == JobKind::GenerateVideo {
            let generator = self.providers.task_generator(job.provider)?;
            let bearer = self.credential(generator.auth_scheme()).await?;
            let source = request.source_image.as_deref().ok_or_else(|| {
                AppError::Validation("video jobs need a source image".to_string())
            })?;
            let params = request.video.clone().unwrap_or_default();
            let task_id = generator
                .submit(source, &request.prompt, &params, bearer.as_deref())
                .await?;
            return Ok(JobResult::VideoTask { task_id });
        }

        let generator = self.providers.generator(job.provider)?;
        let bearer = self.credential(generator.auth_scheme()).await?;
        let input = GenerationInput {
            prompt: request.prompt.clone(),
            reference_image: request.source_image.clone(),
            output: output_format(job.kind),
        };
        let artifact = generator.generate(&input, bearer.as_deref()).await?;
        shape_result(job, artifact)
    }

    async fn credential(&self, scheme: AuthScheme) -> Result<Option<String>, AppError> {
        match scheme {
            AuthScheme::ApiKey => Ok(None),
            AuthScheme::OAuthBearer => {
                let cache = self.token_cache.as_ref().ok_or_else(|| {
                    AppError::Internal(anyhow::anyhow!(
                        "OAuth provider configured without a token cache"
                    ))
                })?;
                Ok(Some(cache.get_token().await?))
            }
        }
    }

    fn timeout_error(&self) -> AppError {
        AppError::ProviderTimeout(format!(
            "no answer after {} seconds",
            self.config.provider_timeout_secs
        ))
    }
}

fn worker_failure(join_error: tokio::task::JoinError) -> AppError {
    if join_error.is_panic() {
        let payload = join_error.into_panic();
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        error!(panic = %message, "Job execution panicked");
        AppError::Internal(anyhow::anyhow!("job execution panicked: {}", message))
    } else {
        AppError::Internal(anyhow::anyhow!("job execution was cancelled"))
    }
}

fn output_format(kind: JobKind) -> OutputFormat {
    match kind {
        JobKind::GenerateImage => OutputFormat::Image,
        JobKind::GenerateLandingSection => OutputFormat::Json,
        JobKind::Analyze | JobKind::GenerateVideo => OutputFormat::Text,
    }
}

/// Map a provider artifact onto the result shape of the job's kind
fn shape_result(job: &Job, artifact: GeneratedArtifact) -> Result<JobResult, AppError> {
    match (job.kind, artifact) {
        (JobKind::GenerateImage, GeneratedArtifact::Image(image)) => Ok(JobResult::Image { image }),
        (JobKind::Analyze, GeneratedArtifact::Text(text)) => Ok(JobResult::Text { text }),
        (JobKind::GenerateLandingSection, GeneratedArtifact::Text(text)) => {
            let content = parse_json_output(&text).map_err(|e| {
                AppError::Provider(format!("landing section is not valid JSON: {}", e))
            })?;
            Ok(JobResult::LandingSection {
                section: job
                    .request
                    .section
                    .clone()
                    .unwrap_or_else(|| prompts::DEFAULT_SECTION.to_string()),
                content,
            })
        }
        (kind, _) => Err(AppError::MissingArtifact(format!(
            "provider {} returned the wrong artifact type for {} jobs",
            job.provider, kind
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::models::{ImageData, ProviderKind};

    fn job(kind: JobKind, section: Option<&str>) -> Job {
        Job::new(
            kind,
            "p1".to_string(),
            ProviderKind::Gemini,
            JobRequest {
                prompt: "x".to_string(),
                source_image: None,
                section: section.map(str::to_string),
                video: None,
                context: None,
            },
        )
    }

    #[test]
    fn test_output_format_per_kind() {
        assert_eq!(output_format(JobKind::GenerateImage), OutputFormat::Image);
        assert_eq!(output_format(JobKind::GenerateLandingSection), OutputFormat::Json);
        assert_eq!(output_format(JobKind::Analyze), OutputFormat::Text);
    }

    #[test]
    fn test_shape_landing_section_parses_json() {
        let result = shape_result(
            &job(JobKind::GenerateLandingSection, Some("faq")),
            GeneratedArtifact::Text("```json\n{\"headline\": \"Why us\"}\n```".to_string()),
        )
        .unwrap();
        match result {
            JobResult::LandingSection { section, content } => {
                assert_eq!(section, "faq");
                assert_eq!(content["headline"], "Why us");
            }
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn test_shape_landing_section_rejects_prose() {
        let err = shape_result(
            &job(JobKind::GenerateLandingSection, None),
            GeneratedArtifact::Text("Sure! Here is a hero section.".to_string()),
        )
        .unwrap_err();
        assert!(matches!(err, AppError::Provider(_)));
    }

    #[test]
    fn test_shape_image_keeps_payload_once() {
        let result = shape_result(
            &job(JobKind::GenerateImage, None),
            GeneratedArtifact::Image(ImageData {
                mime_type: "image/png".to_string(),
                data: "AAAA".to_string(),
            }),
        )
        .unwrap();
        match result {
            JobResult::Image { image } => {
                assert_eq!(image.data_url(), "data:image/png;base64,AAAA");
            }
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_worker_panic_is_internal_error() {
        let handle = tokio::spawn(async { panic!("provider exploded") });
        let err = worker_failure(handle.await.unwrap_err());
        assert!(matches!(err, AppError::Internal(_)));
        assert!(err.to_string().contains("provider exploded"));
    }

    #[test]
    fn test_shape_mismatch_is_missing_artifact() {
        let err = shape_result(
            &job(JobKind::GenerateImage, None),
            GeneratedArtifact::Text("no image today".to_string()),
        )
        .unwrap_err();
        assert!(matches!(err, AppError::MissingArtifact(_)));
    }
}
