//! Application configuration
//!
//! Centralized configuration management with environment variable support
//! and sensible defaults.

use std::env;
use std::path::PathBuf;

/// Default Gemini API base URL
pub const DEFAULT_GEMINI_API_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
/// Default Runway API base URL
pub const DEFAULT_RUNWAY_API_BASE_URL: &str = "https://api.dev.runwayml.com";

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Server configuration
    pub server: ServerConfig,
    /// Execution configuration
    pub execution: ExecutionConfig,
    /// Gemini (API key) provider configuration
    pub gemini: GeminiConfig,
    /// Vertex AI (OAuth) provider configuration
    pub vertex: VertexConfig,
    /// Video provider configuration
    pub runway: RunwayConfig,
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port to bind the server to
    pub port: u16,
    /// Host address to bind to
    pub host: String,
}

/// Execution configuration
#[derive(Debug, Clone)]
pub struct ExecutionConfig {
    /// Upper bound for a single provider call (in seconds)
    pub provider_timeout_secs: u64,
    /// Maximum prompt length in characters
    pub max_prompt_length: usize,
}

/// Gemini provider configuration
#[derive(Clone)]
pub struct GeminiConfig {
    /// API key; the provider is disabled when unset
    pub api_key: Option<String>,
    /// Text model name
    pub model: String,
    /// Image model name
    pub image_model: String,
    /// API base URL
    pub base_url: String,
}

/// Vertex AI provider configuration
#[derive(Debug, Clone)]
pub struct VertexConfig {
    /// Path to the service-account JSON; the provider is disabled when unset
    pub credentials_path: Option<PathBuf>,
    /// Vertex region
    pub location: String,
    /// Imagen model name
    pub imagen_model: String,
    /// Override for the regional endpoint (tests, proxies)
    pub base_url: Option<String>,
    /// Tokens are refreshed this many seconds before they expire
    pub token_safety_margin_secs: u64,
}

/// Video provider configuration
#[derive(Clone)]
pub struct RunwayConfig {
    /// API key; the provider is disabled when unset
    pub api_key: Option<String>,
    /// API base URL
    pub base_url: String,
    /// Model name
    pub model: String,
}

// API keys stay out of the startup log line.
impl std::fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("image_model", &self.image_model)
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl std::fmt::Debug for RunwayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunwayConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                port: 8080,
                host: "0.0.0.0".to_string(),
            },
            execution: ExecutionConfig {
                provider_timeout_secs: 120,
                max_prompt_length: 10_000,
            },
            gemini: GeminiConfig {
                api_key: None,
                model: "gemini-2.5-flash".to_string(),
                image_model: "gemini-2.5-flash-image".to_string(),
                base_url: DEFAULT_GEMINI_API_BASE_URL.to_string(),
            },
            vertex: VertexConfig {
                credentials_path: None,
                location: "us-central1".to_string(),
                imagen_model: "imagen-3.0-generate-002".to_string(),
                base_url: None,
                token_safety_margin_secs: 60,
            },
            runway: RunwayConfig {
                api_key: None,
                base_url: DEFAULT_RUNWAY_API_BASE_URL.to_string(),
                model: "gen4_turbo".to_string(),
            },
        }
    }
}

impl Config {
    /// Load configuration from environment variables with defaults
    ///
    /// A `PORT` that is present but not a valid port number is an error.
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = Self::default();

        let port = match parse_port(env::var("PORT").ok())? {
            Some(port) => port,
            None => {
                tracing::warn!(
                    port = defaults.server.port,
                    "PORT is not set, falling back to the default port"
                );
                defaults.server.port
            }
        };

        Ok(Self {
            server: ServerConfig {
                port,
                host: env::var("HOST").unwrap_or(defaults.server.host),
            },
            execution: ExecutionConfig {
                provider_timeout_secs: parse_var("PROVIDER_TIMEOUT_SECS")
                    .unwrap_or(defaults.execution.provider_timeout_secs),
                max_prompt_length: parse_var("MAX_PROMPT_LENGTH")
                    .unwrap_or(defaults.execution.max_prompt_length),
            },
            gemini: GeminiConfig {
                api_key: non_empty_var("GEMINI_API_KEY"),
                model: env::var("GEMINI_MODEL").unwrap_or(defaults.gemini.model),
                image_model: env::var("GEMINI_IMAGE_MODEL")
                    .unwrap_or(defaults.gemini.image_model),
                base_url: env::var("GEMINI_API_BASE_URL").unwrap_or(defaults.gemini.base_url),
            },
            vertex: VertexConfig {
                credentials_path: non_empty_var("GOOGLE_APPLICATION_CREDENTIALS")
                    .map(PathBuf::from),
                location: env::var("VERTEX_LOCATION").unwrap_or(defaults.vertex.location),
                imagen_model: env::var("VERTEX_IMAGEN_MODEL")
                    .unwrap_or(defaults.vertex.imagen_model),
                base_url: non_empty_var("VERTEX_API_BASE_URL"),
                token_safety_margin_secs: parse_var("TOKEN_SAFETY_MARGIN_SECS")
                    .unwrap_or(defaults.vertex.token_safety_margin_secs),
            },
            runway: RunwayConfig {
                api_key: non_empty_var("RUNWAY_API_KEY"),
                base_url: env::var("RUNWAY_API_BASE_URL").unwrap_or(defaults.runway.base_url),
                model: env::var("RUNWAY_MODEL").unwrap_or(defaults.runway.model),
            },
        })
    }

    /// Get the server address as a string
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

/// `Ok(None)` when `PORT` is absent or blank.
fn parse_port(raw: Option<String>) -> anyhow::Result<Option<u16>> {
    match raw.filter(|p| !p.trim().is_empty()) {
        Some(p) => p
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| anyhow::anyhow!("PORT is not a valid port ({}): {}", p, e)),
        None => Ok(None),
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}
