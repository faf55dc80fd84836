//! Runway image-to-video provider
//!
//! Video generation is long-running, so the client only submits a task and
//! reads its state. Polling cadence belongs to the caller. The source image
//! is loaded by the gateway first and sent inline, so an unreachable source
//! fails the submission instead of the task.

use crate::config::RunwayConfig;
use crate::error::AppError;
use crate::providers::{http, AsyncTaskGenerator, AuthScheme, ImageFetcher, TaskPoll, TaskStatus};
use crate::state::models::{ProviderKind, VideoParams};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

const PROVIDER_NAME: &str = "Runway API";
const API_VERSION: &str = "2024-11-06";

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct SubmitRequest<'a> {
    model: &'a str,
    prompt_image: &'a str,
    prompt_text: &'a str,
    duration: u32,
    ratio: &'a str,
}

#[derive(Deserialize, Debug)]
struct SubmitResponse {
    #[serde(default)]
    id: Option<String>,
}

#[derive(Deserialize, Debug)]
struct TaskResponse {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    output: Option<Vec<String>>,
    #[serde(default)]
    failure: Option<String>,
    #[serde(default)]
    progress: Option<f64>,
}

/// Runway provider
pub struct RunwayClient {
    client: reqwest::Client,
    fetcher: ImageFetcher,
    api_key: String,
    base_url: String,
    model: String,
}

impl RunwayClient {
    /// Create a client; fails if the API key is empty
    pub fn new(
        client: reqwest::Client,
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
    ) -> Result<Self, AppError> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(AppError::Validation("Runway API key is empty".to_string()));
        }
        Ok(Self {
            fetcher: ImageFetcher::new(client.clone()),
            client,
            api_key,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
        })
    }

    /// Create a client from configuration, `None` when no key is configured
    pub fn from_config(
        client: reqwest::Client,
        config: &RunwayConfig,
    ) -> Result<Option<Self>, AppError> {
        match &config.api_key {
            Some(key) => Self::new(
                client,
                key.clone(),
                config.base_url.clone(),
                config.model.clone(),
            )
            .map(Some),
            None => Ok(None),
        }
    }

    fn normalize_status(task_id: &str, task: TaskResponse) -> Result<TaskPoll, AppError> {
        let raw = task.status.ok_or_else(|| {
            AppError::MissingArtifact(format!("{} task {} has no status", PROVIDER_NAME, task_id))
        })?;

        let status = match raw.as_str() {
            "SUCCEEDED" => TaskStatus::Completed,
            "FAILED" | "CANCELLED" => TaskStatus::Failed,
            _ => TaskStatus::Processing,
        };

        let output = task.output.filter(|o| !o.is_empty());
        if status == TaskStatus::Completed && output.is_none() {
            return Err(AppError::MissingArtifact(format!(
                "{} task {} succeeded without output",
                PROVIDER_NAME, task_id
            )));
        }

        Ok(TaskPoll {
            task_id: task_id.to_string(),
            status,
            output,
            failure: match status {
                TaskStatus::Failed => Some(task.failure.unwrap_or_else(|| raw.clone())),
                _ => None,
            },
            progress: task.progress,
        })
    }
}

#[async_trait]
impl AsyncTaskGenerator for RunwayClient {
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
        let image = self.fetcher.load(source_image).await?;
        let prompt_image = image.data_url();

        let url = format!("{}/v1/image_to_video", self.base_url);
        let body = SubmitRequest {
            model: &self.model,
            prompt_image: &prompt_image,
            prompt_text: prompt,
            duration: params.duration_secs,
            ratio: &params.ratio,
        };

        tracing::debug!(
            model = %self.model,
            duration = params.duration_secs,
            ratio = %params.ratio,
            mime_type = %image.mime_type,
            "Submitting Runway image-to-video task"
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .header("X-Runway-Version", API_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|e| http::send_error(PROVIDER_NAME, e))?;

        if !response.status().is_success() {
            return Err(http::status_error(PROVIDER_NAME, response, false).await);
        }

        let parsed: SubmitResponse = http::read_json(PROVIDER_NAME, response).await?;
        parsed.id.filter(|id| !id.is_empty()).ok_or_else(|| {
            AppError::MissingArtifact(format!("{} submit response has no task id", PROVIDER_NAME))
        })
    }

    async fn poll(&self, task_id: &str, _bearer: Option<&str>) -> Result<TaskPoll, AppError> {
        let url = format!("{}/v1/tasks/{}", self.base_url, task_id);

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.api_key)
            .header("X-Runway-Version", API_VERSION)
            .send()
            .await
            .map_err(|e| http::send_error(PROVIDER_NAME, e))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(AppError::NotFound(format!("video task {}", task_id)));
        }
        if !response.status().is_success() {
            return Err(http::status_error(PROVIDER_NAME, response, false).await);
        }

        let task: TaskResponse = http::read_json(PROVIDER_NAME, response).await?;
        Self::normalize_status(task_id, task)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use serial_test::serial;

    const INLINE_SOURCE: &str = "data:image/png;base64,aGVsbG8=";

    fn client_for(base_url: &str) -> RunwayClient {
        RunwayClient::new(reqwest::Client::new(), "rw-key", base_url, "gen4_turbo").unwrap()
    }

    #[tokio::test]
    #[serial]
    async fn test_submit_returns_task_id() {
        let mut server = Server::new_async().await;
        let image = server
            .mock("GET", "/ad.png")
            .with_status(200)
            .with_header("content-type", "image/png")
            .with_body("hello")
            .create_async()
            .await;
        let mock = server
            .mock("POST", "/v1/image_to_video")
            .match_header("authorization", "Bearer rw-key")
            .match_header("x-runway-version", API_VERSION)
            .match_body(Matcher::PartialJson(serde_json::json!({
                "model": "gen4_turbo",
                "promptImage": INLINE_SOURCE,
                "promptText": "slow pan",
                "duration": 5,
                "ratio": "1280:720"
            })))
            .with_status(200)
            .with_body(r#"{"id": "task-123"}"#)
            .create_async()
            .await;

        let task_id = client_for(&server.url())
            .submit(
                &format!("{}/ad.png", server.url()),
                "slow pan",
                &VideoParams::default(),
                None,
            )
            .await
            .unwrap();

        image.assert_async().await;
        mock.assert_async().await;
        assert_eq!(task_id, "task-123");
    }

    #[tokio::test]
    #[serial]
    async fn test_submit_rejected_image_is_provider_error() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1/image_to_video")
            .with_status(400)
            .with_body(r#"{"error": "promptImage could not be fetched (404)"}"#)
            .create_async()
            .await;

        let result = client_for(&server.url())
            .submit(INLINE_SOURCE, "pan", &VideoParams::default(), None)
            .await;
        assert!(matches!(result, Err(AppError::Provider(_))));
    }

    #[tokio::test]
    #[serial]
    async fn test_submit_unreachable_source_never_creates_task() {
        let mut server = Server::new_async().await;
        let _image = server
            .mock("GET", "/gone.png")
            .with_status(404)
            .with_body("Not Found")
            .create_async()
            .await;
        let submit = server
            .mock("POST", "/v1/image_to_video")
            .expect(0)
            .create_async()
            .await;

        let result = client_for(&server.url())
            .submit(
                &format!("{}/gone.png", server.url()),
                "pan",
                &VideoParams::default(),
                None,
            )
            .await;

        assert!(matches!(result, Err(AppError::Provider(_))));
        submit.assert_async().await;
    }

    #[tokio::test]
    #[serial]
    async fn test_submit_without_id_is_missing_artifact() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1/image_to_video")
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        let result = client_for(&server.url())
            .submit(INLINE_SOURCE, "pan", &VideoParams::default(), None)
            .await;
        assert!(matches!(result, Err(AppError::MissingArtifact(_))));
    }

    #[tokio::test]
    #[serial]
    async fn test_poll_maps_statuses() {
        let mut server = Server::new_async().await;
        let _running = server
            .mock("GET", "/v1/tasks/t-running")
            .with_status(200)
            .with_body(r#"{"id": "t-running", "status": "RUNNING", "progress": 0.5}"#)
            .create_async()
            .await;
        let _done = server
            .mock("GET", "/v1/tasks/t-done")
            .with_status(200)
            .with_body(r#"{"id": "t-done", "status": "SUCCEEDED", "output": ["https://cdn.runway/v.mp4"]}"#)
            .create_async()
            .await;
        let _failed = server
            .mock("GET", "/v1/tasks/t-failed")
            .with_status(200)
            .with_body(r#"{"id": "t-failed", "status": "FAILED", "failure": "content moderation"}"#)
            .create_async()
            .await;

        let client = client_for(&server.url());

        let running = client.poll("t-running", None).await.unwrap();
        assert_eq!(running.status, TaskStatus::Processing);
        assert_eq!(running.progress, Some(0.5));

        let done = client.poll("t-done", None).await.unwrap();
        assert_eq!(done.status, TaskStatus::Completed);
        assert_eq!(done.output, Some(vec!["https://cdn.runway/v.mp4".to_string()]));

        let failed = client.poll("t-failed", None).await.unwrap();
        assert_eq!(failed.status, TaskStatus::Failed);
        assert_eq!(failed.failure.as_deref(), Some("content moderation"));
    }

    #[tokio::test]
    #[serial]
    async fn test_poll_unknown_task_is_not_found() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/v1/tasks/missing")
            .with_status(404)
            .create_async()
            .await;

        let result = client_for(&server.url()).poll("missing", None).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    #[serial]
    async fn test_poll_succeeded_without_output_is_missing_artifact() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/v1/tasks/t-empty")
            .with_status(200)
            .with_body(r#"{"id": "t-empty", "status": "SUCCEEDED", "output": []}"#)
            .create_async()
            .await;

        let result = client_for(&server.url()).poll("t-empty", None).await;
        assert!(matches!(result, Err(AppError::MissingArtifact(_))));
    }
}
