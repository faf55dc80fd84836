//! Fake providers and helpers shared by the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use ccreaty_gateway::auth::{AuthError, IssuedToken, TokenExchanger};
use ccreaty_gateway::error::AppError;
use ccreaty_gateway::orchestrator::Orchestrator;
use ccreaty_gateway::providers::{
    AsyncTaskGenerator, AuthScheme, GeneratedArtifact, GenerationInput, OutputFormat,
    SyncGenerator, TaskPoll, TaskStatus,
};
use ccreaty_gateway::state::{ImageData, Job, JobStatus, ProviderKind, VideoParams};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Poll a job until it reaches a terminal state, returning every status seen
pub async fn wait_terminal(orchestrator: &Orchestrator, job_id: &str) -> (Job, Vec<JobStatus>) {
    let mut seen = Vec::new();
    for _ in 0..20_000 {
        let job = orchestrator.get_job(job_id).unwrap();
        if seen.last() != Some(&job.status) {
            seen.push(job.status);
        }
        if job.status.is_terminal() {
            return (job, seen);
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("job {} never finished", job_id);
}

/// Gemini-like text/image provider answering from the prompt
pub struct FakeGemini {
    pub calls: AtomicUsize,
    pub delay: Duration,
    pub prompts: Mutex<Vec<String>>,
    pub references: Mutex<Vec<Option<String>>>,
    pub text: String,
}

impl FakeGemini {
    pub fn new() -> Self {
        Self::with_text("A white leather sneaker.")
    }

    pub fn with_text(text: &str) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            delay: Duration::ZERO,
            prompts: Mutex::new(Vec::new()),
            references: Mutex::new(Vec::new()),
            text: text.to_string(),
        }
    }

    pub fn slow(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::new()
        }
    }
}

#[async_trait]
impl SyncGenerator for FakeGemini {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Gemini
    }

    fn auth_scheme(&self) -> AuthScheme {
        AuthScheme::ApiKey
    }

    async fn generate(
        &self,
        input: &GenerationInput,
        bearer: Option<&str>,
    ) -> Result<GeneratedArtifact, AppError> {
        assert!(bearer.is_none(), "API-key providers never get a bearer");
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(input.prompt.clone());
        self.references
            .lock()
            .unwrap()
            .push(input.reference_image.clone());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        match input.output {
            OutputFormat::Image => Ok(GeneratedArtifact::Image(ImageData {
                mime_type: "image/png".to_string(),
                data: input.prompt.replace(' ', "_"),
            })),
            OutputFormat::Text | OutputFormat::Json => {
                Ok(GeneratedArtifact::Text(self.text.clone()))
            }
        }
    }
}

/// OAuth image provider that accepts exactly one bearer token
pub struct FakeImagen {
    pub accepted_token: String,
    pub calls: AtomicUsize,
}

impl FakeImagen {
    pub fn accepting(token: &str) -> Self {
        Self {
            accepted_token: token.to_string(),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl SyncGenerator for FakeImagen {
    fn kind(&self) -> ProviderKind {
        ProviderKind::VertexImagen
    }

    fn auth_scheme(&self) -> AuthScheme {
        AuthScheme::OAuthBearer
    }

    async fn generate(
        &self,
        _input: &GenerationInput,
        bearer: Option<&str>,
    ) -> Result<GeneratedArtifact, AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if bearer != Some(self.accepted_token.as_str()) {
            return Err(AppError::Auth(AuthError::CredentialRejected(401)));
        }
        Ok(GeneratedArtifact::Image(ImageData {
            mime_type: "image/png".to_string(),
            data: "aW1hZ2Vu".to_string(),
        }))
    }
}

/// Exchanger issuing `tok-1`, `tok-2`, ... and counting calls
pub struct CountingExchanger {
    pub exchanges: AtomicUsize,
}

impl CountingExchanger {
    pub fn new() -> Self {
        Self {
            exchanges: AtomicUsize::new(0),
        }
    }

    pub fn count(&self) -> usize {
        self.exchanges.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TokenExchanger for CountingExchanger {
    async fn exchange(&self) -> Result<IssuedToken, AuthError> {
        let n = self.exchanges.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(IssuedToken {
            access_token: format!("tok-{}", n),
            expires_in: Duration::from_secs(3600),
        })
    }
}

/// Exchanger whose token endpoint always refuses
pub struct RejectingExchanger;

#[async_trait]
impl TokenExchanger for RejectingExchanger {
    async fn exchange(&self) -> Result<IssuedToken, AuthError> {
        Err(AuthError::Rejected {
            status: 400,
            body: "invalid_grant".to_string(),
        })
    }
}

/// Image provider that panics mid-call
pub struct PanickingGenerator;

#[async_trait]
impl SyncGenerator for PanickingGenerator {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Gemini
    }

    fn auth_scheme(&self) -> AuthScheme {
        AuthScheme::ApiKey
    }

    async fn generate(
        &self,
        _input: &GenerationInput,
        _bearer: Option<&str>,
    ) -> Result<GeneratedArtifact, AppError> {
        panic!("image decoder blew up");
    }
}

/// Video provider recording submissions
pub struct FakeRunway {
    pub submitted: Mutex<Vec<(String, String, VideoParams)>>,
}

impl FakeRunway {
    pub fn new() -> Self {
        Self {
            submitted: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl AsyncTaskGenerator for FakeRunway {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Runway
    }

    fn auth_scheme(&self) -> AuthScheme {
        AuthScheme::ApiKey
    }

    async fn submit(
        &self,
        source_image: &str,
        prompt: &str,
        params: &VideoParams,
        _bearer: Option<&str>,
    ) -> Result<String, AppError> {
        self.submitted.lock().unwrap().push((
            source_image.to_string(),
            prompt.to_string(),
            params.clone(),
        ));
        Ok("task-42".to_string())
    }

    async fn poll(&self, task_id: &str, _bearer: Option<&str>) -> Result<TaskPoll, AppError> {
        if task_id != "task-42" {
            return Err(AppError::NotFound(format!("video task {}", task_id)));
        }
        Ok(TaskPoll {
            task_id: task_id.to_string(),
            status: TaskStatus::Completed,
            output: Some(vec!["https://cdn.runway.test/clip.mp4".to_string()]),
            failure: None,
            progress: Some(1.0),
        })
    }
}
