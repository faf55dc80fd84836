//! Entity model
//!
//! Projects, jobs and the job lifecycle state machine.

use crate::error::{AppError, ErrorKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a project
pub type ProjectId = String;

/// Unique identifier for a job
pub type JobId = String;

/// Project used when a request does not name one
pub const DEFAULT_PROJECT_ID: &str = "default";

/// One product's creative assets across generation steps
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    /// Unique key
    pub project_id: ProjectId,
    /// Reference asset given when the project was first seen
    pub original_image_url: Option<String>,
    /// Most recent reusable asset produced by a generation step
    pub derived_asset_url: Option<String>,
    /// When the project was created
    pub created_at: DateTime<Utc>,
    /// When the derived asset was last written
    pub updated_at: DateTime<Utc>,
}

impl Project {
    /// Create a new project
    pub fn new(project_id: ProjectId, original_image_url: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            project_id,
            original_image_url,
            derived_asset_url: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Image later steps should start from: derived asset first, then the original
    pub fn latest_image(&self) -> Option<&str> {
        self.derived_asset_url
            .as_deref()
            .or(self.original_image_url.as_deref())
    }
}

/// What a job generates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum JobKind {
    /// Text analysis of a product image
    Analyze,
    /// Ad image generation
    GenerateImage,
    /// Landing-page section copy as structured JSON
    GenerateLandingSection,
    /// Image-to-video task submission
    GenerateVideo,
}

impl JobKind {
    /// Convert the kind to its wire representation
    pub fn as_str(&self) -> &'static str {
        match self {
            JobKind::Analyze => "analyze",
            JobKind::GenerateImage => "generate-image",
            JobKind::GenerateLandingSection => "generate-landing-section",
            JobKind::GenerateVideo => "generate-video",
        }
    }

    /// Whether the job cannot run without a source image
    pub fn requires_source_image(&self) -> bool {
        matches!(self, JobKind::Analyze | JobKind::GenerateVideo)
    }

    /// Whether a successful result becomes the project's derived asset
    pub fn produces_reusable_asset(&self) -> bool {
        matches!(self, JobKind::GenerateImage)
    }
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which backend serves a job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProviderKind {
    /// Gemini API (API key)
    Gemini,
    /// Imagen on Vertex AI (OAuth bearer)
    VertexImagen,
    /// Runway image-to-video (API key)
    Runway,
}

impl ProviderKind {
    /// Convert the provider to its wire representation
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Gemini => "gemini",
            ProviderKind::VertexImagen => "vertex-imagen",
            ProviderKind::Runway => "runway",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle state of a job
///
/// `Pending -> Running -> {Done | Failed}`; the last two are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Created, no provider call yet
    Pending,
    /// Provider work in flight
    Running,
    /// Result recorded
    Done,
    /// Classified error recorded
    Failed,
}

impl JobStatus {
    /// Convert the status to its wire representation
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Running => "running",
            JobStatus::Done => "done",
            JobStatus::Failed => "failed",
        }
    }

    /// Whether no further transition is allowed
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Done | JobStatus::Failed)
    }

    /// Position in the lifecycle; terminal states share the last rank
    pub fn rank(&self) -> u8 {
        match self {
            JobStatus::Pending => 0,
            JobStatus::Running => 1,
            JobStatus::Done | JobStatus::Failed => 2,
        }
    }

    /// Whether `next` is a legal successor of this state
    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        matches!(
            (self, next),
            (JobStatus::Pending, JobStatus::Running)
                | (JobStatus::Running, JobStatus::Done)
                | (JobStatus::Running, JobStatus::Failed)
        )
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parameters of an image-to-video submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoParams {
    /// Clip length in seconds
    pub duration_secs: u32,
    /// Output aspect ratio, e.g. `1280:720`
    pub ratio: String,
}

impl Default for VideoParams {
    fn default() -> Self {
        Self {
            duration_secs: 5,
            ratio: "1280:720".to_string(),
        }
    }
}

/// Normalized input of a job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRequest {
    /// Prompt sent to the provider
    pub prompt: String,
    /// Resolved source/reference image, if any
    pub source_image: Option<String>,
    /// Landing section type (generate-landing-section only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    /// Video parameters (generate-video only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video: Option<VideoParams>,
    /// Free-form product context appended to the prompt
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

/// Inline image payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageData {
    /// Declared MIME type
    pub mime_type: String,
    /// Base64-encoded bytes
    pub data: String,
}

impl ImageData {
    /// `data:` URL form, usable as a later step's source image
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }
}

/// Result payload of a finished job, shaped by its kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum JobResult {
    /// Generated text
    Text {
        /// Text body
        text: String,
    },
    /// Generated image; the `data:` URL form is derived on demand
    Image {
        /// Image payload
        image: ImageData,
    },
    /// Landing-page section descriptor
    LandingSection {
        /// Section type, e.g. `hero`
        section: String,
        /// Structured section content
        content: serde_json::Value,
    },
    /// Submitted video task, poll it via the provider pass-through
    #[serde(rename_all = "camelCase")]
    VideoTask {
        /// Provider task id
        task_id: String,
    },
}

/// Error recorded on a failed job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobFailure {
    /// Classification
    pub kind: ErrorKind,
    /// Human-readable detail
    pub message: String,
}

impl From<&AppError> for JobFailure {
    fn from(err: &AppError) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

/// A state change requested on a job, carrying the payload its target needs
#[derive(Debug, Clone)]
pub enum JobTransition {
    /// Move to `Running`
    Start,
    /// Move to `Done` with a result
    Complete(JobResult),
    /// Move to `Failed` with an error
    Fail(JobFailure),
}

impl JobTransition {
    /// Status this transition leads to
    pub fn target(&self) -> JobStatus {
        match self {
            JobTransition::Start => JobStatus::Running,
            JobTransition::Complete(_) => JobStatus::Done,
            JobTransition::Fail(_) => JobStatus::Failed,
        }
    }
}

/// One tracked asynchronous unit of provider work
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    /// Unique identifier
    pub job_id: JobId,
    /// Owning project (relation only)
    pub project_id: ProjectId,
    /// What the job generates
    pub kind: JobKind,
    /// Backend selected at creation
    pub provider: ProviderKind,
    /// Current lifecycle state
    pub status: JobStatus,
    /// Normalized input
    pub request: JobRequest,
    /// Present only when `Done`
    pub result: Option<JobResult>,
    /// Present only when `Failed`
    pub error: Option<JobFailure>,
    /// When the job was created
    pub created_at: DateTime<Utc>,
    /// When the job started running
    pub started_at: Option<DateTime<Utc>>,
    /// When the job reached a terminal state
    pub finished_at: Option<DateTime<Utc>>,
}

impl Job {
    /// Create a pending job
    pub fn new(
        kind: JobKind,
        project_id: ProjectId,
        provider: ProviderKind,
        request: JobRequest,
    ) -> Self {
        Self {
            job_id: Self::generate_id(),
            project_id,
            kind,
            provider,
            status: JobStatus::Pending,
            request,
            result: None,
            error: None,
            created_at: Utc::now(),
            started_at: None,
            finished_at: None,
        }
    }

    /// Generate a new unique job id (UUID v4)
    pub fn generate_id() -> JobId {
        Uuid::new_v4().to_string()
    }

    /// Apply a transition, enforcing the lifecycle state machine
    ///
    /// On error the job is left untouched.
    pub fn apply(&mut self, transition: JobTransition) -> Result<(), AppError> {
        let next = transition.target();
        if !self.status.can_transition_to(next) {
            return Err(AppError::InvalidTransition(format!(
                "job {} cannot move from {} to {}",
                self.job_id, self.status, next
            )));
        }

        let now = Utc::now();
        match transition {
            JobTransition::Start => self.started_at = Some(now),
            JobTransition::Complete(result) => {
                self.result = Some(result);
                self.finished_at = Some(now);
            }
            JobTransition::Fail(failure) => {
                self.error = Some(failure);
                self.finished_at = Some(now);
            }
        }
        self.status = next;
        Ok(())
    }
}
