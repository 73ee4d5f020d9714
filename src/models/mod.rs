use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;
use validator::Validate;

pub mod link_preview;

pub use link_preview::{EmbeddabilityResult, LinkMetadata, EMBED_CHECK_FAILED};

// ============================================================================
// Clipboard Item Models
// ============================================================================

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ItemKind {
    Text,
    Link,
    Image,
    File,
}

impl ItemKind {
    /// Pasted text is a link when it starts with an http(s) scheme.
    pub fn detect(content: &str) -> Self {
        if content.starts_with("http://") || content.starts_with("https://") {
            ItemKind::Link
        } else {
            ItemKind::Text
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClipboardItem {
    pub id: Uuid,
    pub content: String,
    #[serde(rename = "type")]
    pub kind: ItemKind,
    pub timestamp: DateTime<Utc>,
    pub tags: Vec<String>,
    pub favorite: bool,
    pub title: Option<String>,
    pub domain: Option<String>,
    pub preview: Option<String>,
    pub color: Option<String>,
}

impl ClipboardItem {
    pub fn new(content: String, kind: ItemKind, tags: Vec<String>) -> Self {
        ClipboardItem {
            id: Uuid::new_v4(),
            content,
            kind,
            timestamp: Utc::now(),
            tags,
            favorite: false,
            title: None,
            domain: None,
            preview: None,
            color: None,
        }
    }

    /// Case-insensitive match against content, tags and title. `needle` must
    /// already be lower-cased.
    pub fn matches_search(&self, needle: &str) -> bool {
        self.content.to_lowercase().contains(needle)
            || self.tags.iter().any(|t| t.to_lowercase().contains(needle))
            || self
                .title
                .as_deref()
                .is_some_and(|t| t.to_lowercase().contains(needle))
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateItemRequest {
    #[validate(length(min = 1, max = 100_000, message = "Content must be 1-100000 characters"))]
    pub content: String,
    /// Explicit kind for image/file captures; detected from content otherwise.
    #[serde(rename = "type")]
    pub kind: Option<ItemKind>,
    #[serde(default)]
    #[validate(length(max = 32, message = "At most 32 tags per item"))]
    pub tags: Vec<String>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateItemRequest {
    #[validate(length(max = 32, message = "At most 32 tags per item"))]
    pub tags: Option<Vec<String>>,
    pub favorite: Option<bool>,
    #[validate(length(max = 200, message = "Title must be at most 200 characters"))]
    pub title: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortOrder {
    #[default]
    Newest,
    Oldest,
    MostUsed,
}

/// Query string for `GET /api/items`. `type` and `tag` accept `all`.
#[derive(Debug, Default, Deserialize)]
pub struct ListItemsQuery {
    pub q: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub tag: Option<String>,
    #[serde(default)]
    pub sort: SortOrder,
}
