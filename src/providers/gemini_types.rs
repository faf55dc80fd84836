//! Gemini API request and response types
//!
//! Structs that mirror the Gemini `generateContent` JSON format.

use serde::{Deserialize, Serialize};

/// Top-level Gemini API response
#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct GeminiApiResponse {
    /// List of candidate responses from the model
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    /// Optional feedback about the prompt (e.g., if it was blocked)
    #[serde(default)]
    pub prompt_feedback: Option<PromptFeedback>,
}

/// A single candidate response from the model
#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    /// The content of this candidate
    #[serde(default)]
    pub content: Option<Content>,
    /// Why the model stopped generating (if applicable)
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// Content structure containing parts of the response
#[derive(Deserialize, Debug)]
pub struct Content {
    /// Text and/or inline data parts
    #[serde(default)]
    pub parts: Vec<Part>,
}

/// A single part of content
#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    /// Text content, if this is a text part
    #[serde(default)]
    pub text: Option<String>,
    /// Inline binary payload, if this is a media part
    #[serde(default)]
    pub inline_data: Option<InlineData>,
}

/// Base64 payload with its MIME type
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    /// Declared MIME type
    pub mime_type: String,
    /// Base64-encoded bytes
    pub data: String,
}

/// Feedback about the prompt (e.g., if it was blocked)
#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    /// Reason the prompt was blocked (if applicable)
    #[serde(default)]
    pub block_reason: Option<String>,
}

/// Request structure for Gemini API
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct GeminiApiRequest {
    /// List of content items to send
    pub contents: Vec<RequestContent>,
    /// Optional generation configuration
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
}

/// Content structure for requests
#[derive(Serialize, Debug)]
pub struct RequestContent {
    /// List of content parts
    pub parts: Vec<RequestPart>,
}

/// A single part for requests
#[derive(Serialize, Debug)]
#[serde(untagged)]
pub enum RequestPart {
    /// Text part
    Text {
        /// The text content
        text: String,
    },
    /// Inline image part
    #[serde(rename_all = "camelCase")]
    InlineData {
        /// The image payload
        inline_data: InlineData,
    },
}

/// Generation configuration for requests
#[derive(Serialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    /// MIME type to force for response (e.g., "application/json")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_mime_type: Option<String>,
    /// Output modalities (e.g., `["TEXT", "IMAGE"]` for image models)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_modalities: Option<Vec<String>>,
}
