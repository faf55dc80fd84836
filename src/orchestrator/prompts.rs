//! Prompt templates
//!
//! Turns a caller's prompt, section and product context into the text sent
//! to the provider. Callers may omit the prompt for kinds that have a
//! sensible default.

use crate::state::models::JobKind;

/// Landing section used when the request does not name one
pub const DEFAULT_SECTION: &str = "hero";

const ANALYZE_PROMPT: &str = "Analyze this product image for an advertising brief. \
Describe the product, its category, materials, colors, target audience and the \
three selling points an ad should emphasize.";

const VIDEO_PROMPT: &str = "Slow cinematic camera push-in on the product, soft studio \
lighting, subtle motion, premium commercial look.";

/// Final prompt for a job of `kind`
///
/// `prompt` has already been validated; `None` means the caller relied on
/// the kind's default.
pub fn compose(
    kind: JobKind,
    prompt: Option<&str>,
    section: Option<&str>,
    context: Option<&str>,
) -> String {
    let base = match kind {
        JobKind::Analyze => prompt.unwrap_or(ANALYZE_PROMPT).to_string(),
        JobKind::GenerateImage => prompt.unwrap_or_default().to_string(),
        JobKind::GenerateVideo => prompt.unwrap_or(VIDEO_PROMPT).to_string(),
        JobKind::GenerateLandingSection => {
            landing_section_prompt(section.unwrap_or(DEFAULT_SECTION), prompt)
        }
    };

    match context.map(str::trim).filter(|c| !c.is_empty()) {
        Some(context) => format!("{}\n\nProduct context:\n{}", base, context),
        None => base,
    }
}

fn landing_section_prompt(section: &str, instructions: Option<&str>) -> String {
    let mut prompt = format!(
        "Write the \"{section}\" section of a product landing page. \
Respond only with a JSON object with the fields \"headline\", \"subheadline\", \
\"body\" and \"callToAction\" (all strings)."
    );
    if let Some(extra) = instructions {
        prompt.push_str("\n\nAdditional instructions:\n");
        prompt.push_str(extra);
    }
    prompt
}

/// Whether a job of `kind` can run without an explicit prompt
pub fn has_default(kind: JobKind) -> bool {
    !matches!(kind, JobKind::GenerateImage)
}
