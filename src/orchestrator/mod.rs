//! Orchestrator module
//!
//! Turns a generation request into a tracked job: validation, project
//! resolution, provider routing, spawned execution and outcome recording.
//! [`build_orchestrator`] wires the configured providers and the token
//! cache together from [`Config`].

pub mod config;
pub mod dispatch;
pub mod prompts;
pub mod utils;
pub mod validation;

pub use config::OrchestratorConfig;
pub use dispatch::{JobTicket, Orchestrator};
pub use validation::GenerationRequest;

use crate::auth::service_account::CLOUD_PLATFORM_SCOPE;
use crate::auth::{JwtBearerExchanger, ServiceAccountKey, TokenCache};
use crate::config::Config;
use crate::providers::{GeminiClient, ProviderRegistry, RunwayClient, VertexImagenClient};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Build the orchestrator described by `config`
///
/// Gemini serves text and, unless Vertex credentials are configured, images.
/// A service-account file enables Vertex Imagen for images and creates the
/// shared token cache. Runway serves video.
pub fn build_orchestrator(config: &Config) -> anyhow::Result<Arc<Orchestrator>> {
    let orchestrator_config = OrchestratorConfig::from(&config.execution);
    orchestrator_config.validate()?;

    let client = reqwest::Client::builder()
        .timeout(orchestrator_config.provider_timeout())
        .build()?;

    let mut providers = ProviderRegistry::new();

    if let Some(gemini) = GeminiClient::from_config(client.clone(), &config.gemini)? {
        let gemini = Arc::new(gemini);
        providers = providers.with_text(gemini.clone()).with_image(gemini);
        info!(model = %config.gemini.model, "Gemini provider enabled");
    } else {
        warn!("GEMINI_API_KEY not set: analyze and landing-section jobs are disabled");
    }

    let mut token_cache = None;
    if let Some(path) = &config.vertex.credentials_path {
        let key = ServiceAccountKey::from_file(path)?;
        let project_id = key.project_id.clone().ok_or_else(|| {
            anyhow::anyhow!("service account {} has no project_id", path.display())
        })?;
        let exchanger = JwtBearerExchanger::new(client.clone(), key, CLOUD_PLATFORM_SCOPE)?;
        token_cache = Some(Arc::new(TokenCache::new(
            Arc::new(exchanger),
            Duration::from_secs(config.vertex.token_safety_margin_secs),
        )));
        let vertex = VertexImagenClient::from_config(client.clone(), &config.vertex, &project_id);
        providers = providers.with_image(Arc::new(vertex));
        info!(
            project_id = %project_id,
            location = %config.vertex.location,
            "Vertex AI Imagen provider enabled"
        );
    }

    if let Some(runway) = RunwayClient::from_config(client, &config.runway)? {
        providers = providers.with_video(Arc::new(runway));
        info!(model = %config.runway.model, "Runway provider enabled");
    } else {
        warn!("RUNWAY_API_KEY not set: video jobs are disabled");
    }

    Ok(Arc::new(Orchestrator::new(
        providers,
        token_cache,
        orchestrator_config,
    )))
}
