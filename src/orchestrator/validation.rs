//! Request validation
//!
//! Everything here runs synchronously at submit time, before a job exists
//! or any network call is made.

use crate::error::AppError;
use crate::orchestrator::config::OrchestratorConfig;
use crate::orchestrator::prompts;
use crate::providers::image_fetch::validate_source_url;
use crate::state::models::{JobKind, VideoParams, DEFAULT_PROJECT_ID};
use serde::Deserialize;

const MAX_PROJECT_ID_LENGTH: usize = 128;
const MAX_SECTION_LENGTH: usize = 64;

/// Clip lengths the video provider accepts, in seconds
pub const VIDEO_DURATIONS: [u32; 2] = [5, 10];

/// Aspect ratios the video provider accepts
pub const VIDEO_RATIOS: [&str; 6] = [
    "1280:720", "720:1280", "1104:832", "832:1104", "960:960", "1584:672",
];

/// Body of every generation endpoint
///
/// Fields that do not apply to a kind are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    /// Target project; `"default"` when absent
    pub project_id: Option<String>,
    /// Caller prompt
    pub prompt: Option<String>,
    /// Source/reference image (`https://` or `data:image/...`)
    pub image_url: Option<String>,
    /// Landing section type, e.g. `hero`
    pub section: Option<String>,
    /// Free-form product context
    pub context: Option<String>,
    /// Video clip length in seconds
    pub duration: Option<u32>,
    /// Video aspect ratio
    pub ratio: Option<String>,
}

/// A request that passed validation
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedRequest {
    /// Resolved project id
    pub project_id: String,
    /// Caller prompt, trimmed; `None` when the kind's default applies
    pub prompt: Option<String>,
    /// Explicit source image
    pub image_url: Option<String>,
    /// Landing section type (landing-section jobs only)
    pub section: Option<String>,
    /// Product context, trimmed
    pub context: Option<String>,
    /// Video parameters (video jobs only)
    pub video: Option<VideoParams>,
}

/// Validate a request for a job of `kind`
pub fn validate(
    kind: JobKind,
    request: &GenerationRequest,
    config: &OrchestratorConfig,
) -> Result<ValidatedRequest, AppError> {
    let project_id = validate_project_id(request.project_id.as_deref())?;
    let prompt = trimmed(request.prompt.as_deref());
    let context = trimmed(request.context.as_deref());

    if prompt.is_none() && !prompts::has_default(kind) {
        return Err(AppError::Validation(format!(
            "prompt is required for {} jobs",
            kind
        )));
    }

    let length = prompt.as_deref().map_or(0, |p| p.chars().count())
        + context.as_deref().map_or(0, |c| c.chars().count());
    if length > config.max_prompt_length {
        return Err(AppError::Validation(format!(
            "Prompt too long ({} > {} characters)",
            length, config.max_prompt_length
        )));
    }

    let image_url = trimmed(request.image_url.as_deref());
    if let Some(url) = &image_url {
        validate_source_url(url)?;
    }

    let section = match kind {
        JobKind::GenerateLandingSection => Some(validate_section(request.section.as_deref())?),
        _ => None,
    };

    let video = match kind {
        JobKind::GenerateVideo => Some(validate_video_params(
            request.duration,
            request.ratio.as_deref(),
        )?),
        _ => None,
    };

    Ok(ValidatedRequest {
        project_id,
        prompt,
        image_url,
        section,
        context,
        video,
    })
}

fn trimmed(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn validate_project_id(project_id: Option<&str>) -> Result<String, AppError> {
    let Some(id) = project_id else {
        return Ok(DEFAULT_PROJECT_ID.to_string());
    };
    let id = id.trim();
    if id.is_empty() {
        return Err(AppError::Validation("projectId cannot be empty".to_string()));
    }
    if id.len() > MAX_PROJECT_ID_LENGTH {
        return Err(AppError::Validation(format!(
            "projectId longer than {} characters",
            MAX_PROJECT_ID_LENGTH
        )));
    }
    if !id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
    {
        return Err(AppError::Validation(format!(
            "projectId '{}' may only contain letters, digits, '-', '_' and '.'",
            id
        )));
    }
    Ok(id.to_string())
}

fn validate_section(section: Option<&str>) -> Result<String, AppError> {
    let section = section.map(str::trim).unwrap_or(prompts::DEFAULT_SECTION);
    if section.is_empty()
        || section.len() > MAX_SECTION_LENGTH
        || !section
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_'))
    {
        return Err(AppError::Validation(format!(
            "invalid landing section '{}'",
            section
        )));
    }
    Ok(section.to_ascii_lowercase())
}

fn validate_video_params(duration: Option<u32>, ratio: Option<&str>) -> Result<VideoParams, AppError> {
    let defaults = VideoParams::default();
    let duration_secs = duration.unwrap_or(defaults.duration_secs);
    if !VIDEO_DURATIONS.contains(&duration_secs) {
        return Err(AppError::Validation(format!(
            "duration must be one of {:?} seconds, got {}",
            VIDEO_DURATIONS, duration_secs
        )));
    }
    let ratio = ratio.map(str::trim).unwrap_or(&defaults.ratio);
    if !VIDEO_RATIOS.contains(&ratio) {
        return Err(AppError::Validation(format!(
            "ratio must be one of {:?}, got '{}'",
            VIDEO_RATIOS, ratio
        )));
    }
    Ok(VideoParams {
        duration_secs,
        ratio: ratio.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> OrchestratorConfig {
        OrchestratorConfig {
            max_prompt_length: 20,
            ..Default::default()
        }
    }

    fn request(prompt: &str) -> GenerationRequest {
        GenerationRequest {
            prompt: Some(prompt.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_defaults_project_and_trims_prompt() {
        let validated = validate(JobKind::GenerateImage, &request("  shoe  "), &config()).unwrap();
        assert_eq!(validated.project_id, DEFAULT_PROJECT_ID);
        assert_eq!(validated.prompt.as_deref(), Some("shoe"));
        assert!(validated.video.is_none());
        assert!(validated.section.is_none());
    }

    #[test]
    fn test_image_requires_prompt() {
        let err = validate(JobKind::GenerateImage, &request("   "), &config()).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(validate(JobKind::Analyze, &GenerationRequest::default(), &config()).is_ok());
    }

    #[test]
    fn test_prompt_and_context_share_length_limit() {
        let mut req = request("0123456789");
        assert!(validate(JobKind::GenerateImage, &req, &config()).is_ok());
        req.context = Some("01234567890".to_string());
        assert!(matches!(
            validate(JobKind::GenerateImage, &req, &config()),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_insecure_image_url_rejected() {
        let req = GenerationRequest {
            image_url: Some("http://cdn.example.com/shoe.png".to_string()),
            ..request("shoe")
        };
        assert!(matches!(
            validate(JobKind::GenerateImage, &req, &config()),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_project_id_charset() {
        let mut req = request("shoe");
        req.project_id = Some("summer-2024_v1.2".to_string());
        assert_eq!(
            validate(JobKind::GenerateImage, &req, &config()).unwrap().project_id,
            "summer-2024_v1.2"
        );
        req.project_id = Some("../etc".to_string());
        assert!(validate(JobKind::GenerateImage, &req, &config()).is_err());
        req.project_id = Some(" ".to_string());
        assert!(validate(JobKind::GenerateImage, &req, &config()).is_err());
    }

    #[test]
    fn test_video_params_defaults_and_bounds() {
        let validated = validate(JobKind::GenerateVideo, &GenerationRequest::default(), &config())
            .unwrap();
        assert_eq!(validated.video, Some(VideoParams::default()));

        let req = GenerationRequest {
            duration: Some(7),
            ..Default::default()
        };
        assert!(validate(JobKind::GenerateVideo, &req, &config()).is_err());

        let req = GenerationRequest {
            ratio: Some("16:9".to_string()),
            ..Default::default()
        };
        assert!(validate(JobKind::GenerateVideo, &req, &config()).is_err());

        let req = GenerationRequest {
            duration: Some(10),
            ratio: Some("720:1280".to_string()),
            ..Default::default()
        };
        let video = validate(JobKind::GenerateVideo, &req, &config())
            .unwrap()
            .video
            .unwrap();
        assert_eq!(video.duration_secs, 10);
        assert_eq!(video.ratio, "720:1280");
    }

    #[test]
    fn test_landing_section_default_and_format() {
        let validated =
            validate(JobKind::GenerateLandingSection, &GenerationRequest::default(), &config())
                .unwrap();
        assert_eq!(validated.section.as_deref(), Some("hero"));

        let req = GenerationRequest {
            section: Some("FAQ".to_string()),
            ..Default::default()
        };
        assert_eq!(
            validate(JobKind::GenerateLandingSection, &req, &config())
                .unwrap()
                .section
                .as_deref(),
            Some("faq")
        );

        let req = GenerationRequest {
            section: Some("hero section!".to_string()),
            ..Default::default()
        };
        assert!(validate(JobKind::GenerateLandingSection, &req, &config()).is_err());
    }
}
