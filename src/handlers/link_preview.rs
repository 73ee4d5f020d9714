use axum::extract::{Query, State};
use axum::Json;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client as ReqwestClient;
use url::Url;

use crate::config::FetchSettings;
use crate::error::{AppResult, UpstreamError};
use crate::handlers::upstream::{check_target, parse_target, required_url, TargetQuery};
use crate::models::LinkMetadata;
use crate::state::AppState;

// ── Extraction rules ───────────────────────────────────────────────────────

/// A single pattern whose first capture group is the extracted value.
struct Rule {
    name: &'static str,
    pattern: Regex,
}

impl Rule {
    fn new(name: &'static str, pattern: &str) -> Self {
        Rule {
            name,
            pattern: Regex::new(&format!("(?i){pattern}")).expect("extraction rule must compile"),
        }
    }

    /// `<meta property="og:x" content="...">`
    fn property_first(property: &'static str) -> Self {
        Rule::new(
            property,
            &format!(
                r#"<meta[^>]+property=["']{}["'][^>]+content=["']([^"']+)["'][^>]*>"#,
                regex::escape(property)
            ),
        )
    }

    /// `<meta content="..." property="og:x">`
    fn content_first(property: &'static str) -> Self {
        Rule::new(
            property,
            &format!(
                r#"<meta[^>]+content=["']([^"']+)["'][^>]+property=["']{}["'][^>]*>"#,
                regex::escape(property)
            ),
        )
    }
}

static TITLE_RULES: Lazy<Vec<Rule>> = Lazy::new(|| {
    vec![
        Rule::new("title", r"<title[^>]*>([^<]+)</title>"),
        Rule::property_first("og:title"),
        Rule::content_first("og:title"),
    ]
});

static DESCRIPTION_RULES: Lazy<Vec<Rule>> = Lazy::new(|| {
    vec![
        Rule::property_first("og:description"),
        Rule::content_first("og:description"),
        Rule::new(
            "description",
            r#"<meta[^>]+name=["']description["'][^>]+content=["']([^"']+)["'][^>]*>"#,
        ),
    ]
});

static IMAGE_RULES: Lazy<Vec<Rule>> = Lazy::new(|| {
    vec![
        Rule::property_first("og:image"),
        Rule::content_first("og:image"),
    ]
});

/// Evaluate `rules` in order and return the trimmed capture of the first one
/// that matches. Later rules are never consulted once one matches, even when
/// its capture trims to an empty string.
fn first_match(rules: &[Rule], html: &str) -> Option<String> {
    rules.iter().find_map(|rule| {
        rule.pattern.captures(html).map(|caps| {
            tracing::trace!(rule = rule.name, "Extraction rule matched");
            caps[1].trim().to_string()
        })
    })
}

/// Pull title, description and image out of raw HTML with the ordered rule
/// lists above. `domain` stands in for a missing title.
pub fn extract_metadata(html: &str, url: &str, domain: &str) -> LinkMetadata {
    LinkMetadata {
        title: first_match(&TITLE_RULES, html).unwrap_or_else(|| domain.to_string()),
        description: first_match(&DESCRIPTION_RULES, html).unwrap_or_default(),
        image: first_match(&IMAGE_RULES, html),
        domain: domain.to_string(),
        url: url.to_string(),
    }
}

// ── Fetching ───────────────────────────────────────────────────────────────

async fn read_capped(mut response: reqwest::Response, cap: usize) -> Result<String, UpstreamError> {
    let mut body: Vec<u8> = Vec::new();
    while let Some(chunk) = response.chunk().await? {
        let room = cap.saturating_sub(body.len());
        if chunk.len() >= room {
            body.extend_from_slice(&chunk[..room]);
            tracing::debug!(cap, "Link preview body truncated at cap");
            break;
        }
        body.extend_from_slice(&chunk);
    }
    Ok(String::from_utf8_lossy(&body).into_owned())
}

async fn fetch_page_unbounded(
    client: &ReqwestClient,
    settings: &FetchSettings,
    target: &Url,
) -> Result<String, UpstreamError> {
    check_target(target, settings).await?;

    let response = client.get(target.as_str()).send().await?;
    if !response.status().is_success() {
        return Err(UpstreamError::Status(response.status()));
    }
    read_capped(response, settings.preview_max_body_bytes).await
}

/// Dropping the inner future on timeout cancels the in-flight request.
async fn fetch_page(
    client: &ReqwestClient,
    settings: &FetchSettings,
    target: &Url,
) -> Result<String, UpstreamError> {
    tokio::time::timeout(
        settings.preview_timeout,
        fetch_page_unbounded(client, settings, target),
    )
    .await
    .map_err(|_| UpstreamError::Timeout(settings.preview_timeout))?
}

/// Fetch `url` and extract its metadata.
///
/// Fails only when `url` is not an absolute URL with a host. Every upstream
/// problem is logged and answered with [`LinkMetadata::degraded`].
pub async fn fetch_link_metadata(
    client: &ReqwestClient,
    settings: &FetchSettings,
    url: &str,
) -> AppResult<LinkMetadata> {
    let (target, domain) = parse_target(url)?;

    match fetch_page(client, settings, &target).await {
        Ok(html) => Ok(extract_metadata(&html, url, &domain)),
        Err(e) => {
            tracing::warn!(error = %e, url = %url, "Failed to fetch link metadata, using fallback");
            Ok(LinkMetadata::degraded(url, &domain))
        }
    }
}

// ── Handler ────────────────────────────────────────────────────────────────

/// GET /api/link-preview?url=<encoded-url>
pub async fn get_link_preview(
    State(state): State<AppState>,
    Query(params): Query<TargetQuery>,
) -> AppResult<Json<LinkMetadata>> {
    let url = required_url(&params)?;
    let metadata = fetch_link_metadata(&state.http_client, &state.fetch, &url).await?;
    Ok(Json(metadata))
}

// ── Unit tests ─────────────────────────────────────────────────────────────
