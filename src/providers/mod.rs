//! Provider clients
//!
//! Interchangeable generative backends behind two capability shapes:
//! [`SyncGenerator`] (artifact comes back inline in one round trip) and
//! [`AsyncTaskGenerator`] (submit returns a task id, completion is observed by
//! polling). Every implementation normalizes its failures into
//! [`AppError`] before returning, so no provider-specific error shape reaches
//! the orchestrator.

pub mod gemini;
pub mod gemini_types;
pub mod http;
pub mod image_fetch;
pub mod runway;
pub mod vertex;

pub use gemini::GeminiClient;
pub use image_fetch::ImageFetcher;
pub use runway::RunwayClient;
pub use vertex::VertexImagenClient;

use crate::error::AppError;
use crate::state::models::{ImageData, JobKind, ProviderKind, VideoParams};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// How a provider authenticates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthScheme {
    /// Static API key configured on the client
    ApiKey,
    /// Short-lived bearer token from the token cache
    OAuthBearer,
}

/// Shape of the artifact a synchronous generation should return
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Free text
    Text,
    /// Text that must be a JSON document
    Json,
    /// Inline image
    Image,
}

/// Input of a synchronous generation
#[derive(Debug, Clone)]
pub struct GenerationInput {
    /// Prompt text
    pub prompt: String,
    /// Optional reference image (`https://` or `data:` URL)
    pub reference_image: Option<String>,
    /// Expected artifact shape
    pub output: OutputFormat,
}

/// Artifact returned by a synchronous generation
#[derive(Debug, Clone, PartialEq)]
pub enum GeneratedArtifact {
    /// Text (or JSON text)
    Text(String),
    /// Inline image
    Image(ImageData),
}

/// State of a provider-side asynchronous task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    /// Queued or running
    Processing,
    /// Finished with output
    Completed,
    /// Finished without output
    Failed,
}

/// Result of polling an asynchronous task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPoll {
    /// Provider task id
    pub task_id: String,
    /// Normalized status
    pub status: TaskStatus,
    /// Output URLs once completed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<Vec<String>>,
    /// Provider failure reason once failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
    /// Progress in [0, 1] when the provider reports it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<f64>,
}

/// Provider that returns its artifact inline
#[async_trait]
pub trait SyncGenerator: Send + Sync {
    /// Provider identity
    fn kind(&self) -> ProviderKind;

    /// Authentication the orchestrator must supply
    fn auth_scheme(&self) -> AuthScheme;

    /// Run one generation; `bearer` is set for [`AuthScheme::OAuthBearer`]
    async fn generate(
        &self,
        input: &GenerationInput,
        bearer: Option<&str>,
    ) -> Result<GeneratedArtifact, AppError>;
}

/// Provider that runs work as a remote task
#[async_trait]
pub trait AsyncTaskGenerator: Send + Sync {
    /// Provider identity
    fn kind(&self) -> ProviderKind;

    /// Authentication the orchestrator must supply
    fn auth_scheme(&self) -> AuthScheme;

    /// Submit a task and return its provider id
    async fn submit(
        &self,
        source_image: &str,
        prompt: &str,
        params: &VideoParams,
        bearer: Option<&str>,
    ) -> Result<String, AppError>;

    /// Read the current state of a task
    async fn poll(&self, task_id: &str, bearer: Option<&str>) -> Result<TaskPoll, AppError>;
}

/// Configured providers and which one serves each job kind
///
/// Routing picks a [`ProviderKind`] at job creation; execution looks the
/// client up again by that tag.
#[derive(Default, Clone)]
pub struct ProviderRegistry {
    generators: HashMap<ProviderKind, Arc<dyn SyncGenerator>>,
    task_generators: HashMap<ProviderKind, Arc<dyn AsyncTaskGenerator>>,
    text_route: Option<ProviderKind>,
    image_route: Option<ProviderKind>,
    video_route: Option<ProviderKind>,
}

impl ProviderRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve analyze and landing-section jobs with `generator`
    pub fn with_text(mut self, generator: Arc<dyn SyncGenerator>) -> Self {
        self.text_route = Some(generator.kind());
        self.generators.insert(generator.kind(), generator);
        self
    }

    /// Serve image jobs with `generator`
    pub fn with_image(mut self, generator: Arc<dyn SyncGenerator>) -> Self {
        self.image_route = Some(generator.kind());
        self.generators.insert(generator.kind(), generator);
        self
    }

    /// Serve video jobs with `generator`
    pub fn with_video(mut self, generator: Arc<dyn AsyncTaskGenerator>) -> Self {
        self.video_route = Some(generator.kind());
        self.task_generators.insert(generator.kind(), generator);
        self
    }

    /// Provider that will serve a job of `kind`
    pub fn route(&self, kind: JobKind) -> Result<ProviderKind, AppError> {
        let route = match kind {
            JobKind::Analyze | JobKind::GenerateLandingSection => self.text_route,
            JobKind::GenerateImage => self.image_route,
            JobKind::GenerateVideo => self.video_route,
        };
        route.ok_or_else(|| {
            AppError::Validation(format!("no provider is configured for {} jobs", kind))
        })
    }

    /// Synchronous client for a provider tag
    pub fn generator(&self, provider: ProviderKind) -> Result<Arc<dyn SyncGenerator>, AppError> {
        self.generators.get(&provider).cloned().ok_or_else(|| {
            AppError::Internal(anyhow::anyhow!(
                "provider {} has no synchronous client",
                provider
            ))
        })
    }

    /// Task client for a provider tag
    pub fn task_generator(
        &self,
        provider: ProviderKind,
    ) -> Result<Arc<dyn AsyncTaskGenerator>, AppError> {
        self.task_generators.get(&provider).cloned().ok_or_else(|| {
            AppError::Internal(anyhow::anyhow!("provider {} has no task client", provider))
        })
    }

    /// Task client serving video jobs, for the poll pass-through
    pub fn video_generator(&self) -> Result<Arc<dyn AsyncTaskGenerator>, AppError> {
        let provider = self.route(JobKind::GenerateVideo)?;
        self.task_generator(provider)
    }

    /// Names of the configured providers, for the health endpoint
    pub fn configured(&self) -> Vec<ProviderKind> {
        let mut kinds: Vec<ProviderKind> = self
            .generators
            .keys()
            .chain(self.task_generators.keys())
            .copied()
            .collect();
        kinds.sort_by_key(|k| k.as_str());
        kinds.dedup();
        kinds
    }
}
