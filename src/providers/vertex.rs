//! Imagen on Vertex AI
//!
//! Text-to-image through the Vertex `:predict` endpoint. Requests carry an
//! OAuth bearer token obtained from the token cache by the orchestrator.

use crate::config::VertexConfig;
use crate::error::AppError;
use crate::providers::{http, AuthScheme, GeneratedArtifact, GenerationInput, OutputFormat, SyncGenerator};
use crate::state::models::{ImageData, ProviderKind};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;

const PROVIDER_NAME: &str = "Vertex AI Imagen";

#[derive(Deserialize, Debug)]
struct PredictResponse {
    #[serde(default)]
    predictions: Vec<Prediction>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct Prediction {
    #[serde(default)]
    bytes_base64_encoded: Option<String>,
    #[serde(default)]
    mime_type: Option<String>,
    #[serde(default)]
    rai_filtered_reason: Option<String>,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct PredictParameters {
    sample_count: u32,
    aspect_ratio: String,
}

/// Vertex AI Imagen provider
pub struct VertexImagenClient {
    client: reqwest::Client,
    endpoint: String,
}

impl VertexImagenClient {
    /// Create a client for `model` in `project_id`/`location`
    ///
    /// `base_url` overrides the regional endpoint host.
    pub fn new(
        client: reqwest::Client,
        project_id: &str,
        location: &str,
        model: &str,
        base_url: Option<&str>,
    ) -> Self {
        let base = base_url
            .map(|b| b.trim_end_matches('/').to_string())
            .unwrap_or_else(|| format!("https://{}-aiplatform.googleapis.com", location));
        let endpoint = format!(
            "{}/v1/projects/{}/locations/{}/publishers/google/models/{}:predict",
            base, project_id, location, model
        );
        Self { client, endpoint }
    }

    /// Create a client from configuration for the service account's project
    pub fn from_config(client: reqwest::Client, config: &VertexConfig, project_id: &str) -> Self {
        Self::new(
            client,
            project_id,
            &config.location,
            &config.imagen_model,
            config.base_url.as_deref(),
        )
    }

    /// Full `:predict` URL this client posts to
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl SyncGenerator for VertexImagenClient {
    fn kind(&self) -> ProviderKind {
        ProviderKind::VertexImagen
    }

    fn auth_scheme(&self) -> AuthScheme {
        AuthScheme::OAuthBearer
    }

    async fn generate(
        &self,
        input: &GenerationInput,
        bearer: Option<&str>,
    ) -> Result<GeneratedArtifact, AppError> {
        if input.output != OutputFormat::Image {
            return Err(AppError::Internal(anyhow::anyhow!(
                "{} only produces images",
                PROVIDER_NAME
            )));
        }
        let token = bearer.ok_or_else(|| {
            AppError::Internal(anyhow::anyhow!("{} called without a bearer token", PROVIDER_NAME))
        })?;

        if let Some(reference) = &input.reference_image {
            // Text-to-image model: the reference is carried by the prompt only.
            tracing::warn!(
                endpoint = %self.endpoint,
                reference = %reference.chars().take(64).collect::<String>(),
                "Vertex Imagen cannot use the reference image, generating from the prompt alone"
            );
        }

        let body = json!({
            "instances": [{ "prompt": input.prompt }],
            "parameters": PredictParameters {
                sample_count: 1,
                aspect_ratio: "1:1".to_string(),
            },
        });

        tracing::debug!(
            endpoint = %self.endpoint,
            prompt_len = input.prompt.len(),
            "Calling Vertex AI Imagen"
        );

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .map_err(|e| http::send_error(PROVIDER_NAME, e))?;

        if !response.status().is_success() {
            return Err(http::status_error(PROVIDER_NAME, response, true).await);
        }

        let parsed: PredictResponse = http::read_json(PROVIDER_NAME, response).await?;
        let prediction = parsed.predictions.into_iter().next().ok_or_else(|| {
            AppError::MissingArtifact(format!("{} returned no predictions", PROVIDER_NAME))
        })?;

        match prediction.bytes_base64_encoded.filter(|b| !b.is_empty()) {
            Some(data) => Ok(GeneratedArtifact::Image(ImageData {
                mime_type: prediction
                    .mime_type
                    .unwrap_or_else(|| "image/png".to_string()),
                data,
            })),
            None => Err(AppError::MissingArtifact(format!(
                "{} prediction has no image bytes{}",
                PROVIDER_NAME,
                prediction
                    .rai_filtered_reason
                    .map(|r| format!(" (filtered: {})", r))
                    .unwrap_or_default()
            ))),
        }
    }
}
