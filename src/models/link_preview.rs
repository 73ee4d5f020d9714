use serde::{Deserialize, Serialize};

/// Metadata returned by `GET /api/link-preview`.
///
/// Always fully populated: when the page cannot be fetched the title falls
/// back to the hostname and the remaining fields are empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkMetadata {
    pub title: String,
    pub description: String,
    pub image: Option<String>,
    pub domain: String,
    pub url: String,
}

impl LinkMetadata {
    /// The shape returned when the upstream page is unreachable or unusable.
    pub fn degraded(url: &str, domain: &str) -> Self {
        LinkMetadata {
            title: domain.to_string(),
            description: String::new(),
            image: None,
            domain: domain.to_string(),
            url: url.to_string(),
        }
    }
}

pub const EMBED_CHECK_FAILED: &str = "Failed to check headers";

/// Result of `GET /api/check-embedding`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbeddabilityResult {
    pub can_embed: bool,
    pub x_frame_options: Option<String>,
    pub csp: Option<String>,
    /// Set only when the headers could not be examined at all.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl EmbeddabilityResult {
    /// Fail-closed result for probes that never got a response.
    pub fn failed() -> Self {
        EmbeddabilityResult {
            can_embed: false,
            x_frame_options: None,
            csp: None,
            error: Some(EMBED_CHECK_FAILED.to_string()),
        }
    }
}
