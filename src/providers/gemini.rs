//! Gemini API client
//!
//! Direct HTTP client for the Gemini `generateContent` endpoint, used for
//! text, JSON and image generation. Authenticates with a static API key.

use crate::config::GeminiConfig;
use crate::error::AppError;
use crate::providers::gemini_types::{
    GeminiApiRequest, GeminiApiResponse, GenerationConfig, InlineData, RequestContent,
    RequestPart,
};
use crate::providers::{
    http, AuthScheme, GeneratedArtifact, GenerationInput, ImageFetcher, OutputFormat,
    SyncGenerator,
};
use crate::state::models::{ImageData, ProviderKind};
use async_trait::async_trait;

const PROVIDER_NAME: &str = "Gemini API";

/// Gemini provider
pub struct GeminiClient {
    client: reqwest::Client,
    fetcher: ImageFetcher,
    api_key: String,
    text_model: String,
    image_model: String,
    base_url: String,
}

impl GeminiClient {
    /// Create a client; fails if the API key is empty
    pub fn new(
        client: reqwest::Client,
        api_key: impl Into<String>,
        text_model: impl Into<String>,
        image_model: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Result<Self, AppError> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(AppError::Validation("Gemini API key is empty".to_string()));
        }
        Ok(Self {
            fetcher: ImageFetcher::new(client.clone()),
            client,
            api_key,
            text_model: text_model.into(),
            image_model: image_model.into(),
            base_url: base_url.into(),
        })
    }

    /// Create a client from configuration, `None` when no key is configured
    pub fn from_config(
        client: reqwest::Client,
        config: &GeminiConfig,
    ) -> Result<Option<Self>, AppError> {
        match &config.api_key {
            Some(key) => Self::new(
                client,
                key.clone(),
                config.model.clone(),
                config.image_model.clone(),
                config.base_url.clone(),
            )
            .map(Some),
            None => Ok(None),
        }
    }

    fn build_request(&self, input: &GenerationInput, reference: Option<ImageData>) -> GeminiApiRequest {
        let mut parts = vec![RequestPart::Text {
            text: input.prompt.clone(),
        }];
        if let Some(image) = reference {
            parts.push(RequestPart::InlineData {
                inline_data: InlineData {
                    mime_type: image.mime_type,
                    data: image.data,
                },
            });
        }

        let generation_config = match input.output {
            OutputFormat::Text => None,
            OutputFormat::Json => Some(GenerationConfig {
                response_mime_type: Some("application/json".to_string()),
                ..Default::default()
            }),
            OutputFormat::Image => Some(GenerationConfig {
                response_modalities: Some(vec!["TEXT".to_string(), "IMAGE".to_string()]),
                ..Default::default()
            }),
        };

        GeminiApiRequest {
            contents: vec![RequestContent { parts }],
            generation_config,
        }
    }

    fn extract_artifact(
        parsed: GeminiApiResponse,
        output: OutputFormat,
    ) -> Result<GeneratedArtifact, AppError> {
        // Check for blocked prompt
        if let Some(reason) = parsed.prompt_feedback.and_then(|f| f.block_reason) {
            return Err(AppError::Provider(format!(
                "Gemini API blocked the prompt: {}",
                reason
            )));
        }

        let candidate = parsed.candidates.into_iter().next().ok_or_else(|| {
            AppError::MissingArtifact("Gemini API response contains no candidates".to_string())
        })?;
        let finish_reason = candidate.finish_reason.unwrap_or_default();
        let parts = candidate.content.map(|c| c.parts).unwrap_or_default();

        match output {
            OutputFormat::Text | OutputFormat::Json => parts
                .into_iter()
                .filter_map(|p| p.text)
                .find(|t| !t.trim().is_empty())
                .map(GeneratedArtifact::Text)
                .ok_or_else(|| {
                    AppError::MissingArtifact(format!(
                        "Gemini API response contains no text (finish reason: {})",
                        finish_reason
                    ))
                }),
            OutputFormat::Image => parts
                .into_iter()
                .filter_map(|p| p.inline_data)
                .find(|d| !d.data.is_empty())
                .map(|d| {
                    GeneratedArtifact::Image(ImageData {
                        mime_type: d.mime_type,
                        data: d.data,
                    })
                })
                .ok_or_else(|| {
                    AppError::MissingArtifact(format!(
                        "Gemini API response contains no image (finish reason: {})",
                        finish_reason
                    ))
                }),
        }
    }
}

#[async_trait]
impl SyncGenerator for GeminiClient {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Gemini
    }

    fn auth_scheme(&self) -> AuthScheme {
        AuthScheme::ApiKey
    }

    async fn generate(
        &self,
        input: &GenerationInput,
        _bearer: Option<&str>,
    ) -> Result<GeneratedArtifact, AppError> {
        let model_name = match input.output {
            OutputFormat::Image => &self.image_model,
            OutputFormat::Text | OutputFormat::Json => &self.text_model,
        };
        let url = format!("{}/models/{}:generateContent", self.base_url, model_name);

        let reference = match &input.reference_image {
            Some(source) => Some(self.fetcher.load(source).await?),
            None => None,
        };
        let request_body = self.build_request(input, reference);

        tracing::debug!(
            model = %model_name,
            output = ?input.output,
            has_reference = input.reference_image.is_some(),
            prompt_len = input.prompt.len(),
            "Calling Gemini API"
        );

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&request_body)
            .send()
            .await
            .map_err(|e| http::send_error(PROVIDER_NAME, e))?;

        if !response.status().is_success() {
            return Err(http::status_error(PROVIDER_NAME, response, false).await);
        }

        let parsed: GeminiApiResponse = http::read_json(PROVIDER_NAME, response).await?;
        let artifact = Self::extract_artifact(parsed, input.output)?;

        tracing::debug!(model = %model_name, "Successfully received response from Gemini API");
        Ok(artifact)
    }
}
