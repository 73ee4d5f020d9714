use axum::extract::{Query, State};
use axum::Json;
use reqwest::header::{HeaderMap, HeaderName, CONTENT_SECURITY_POLICY, X_FRAME_OPTIONS};
use reqwest::Client as ReqwestClient;
use url::Url;

use crate::config::FetchSettings;
use crate::error::{AppResult, UpstreamError};
use crate::handlers::upstream::{check_target, parse_target, required_url, TargetQuery};
use crate::models::EmbeddabilityResult;
use crate::state::AppState;

pub const CSP_DISPLAY_CHARS: usize = 100;
pub const CSP_TRUNCATION_MARKER: &str = "...";

/// Decide whether a page with these headers can be shown in an iframe.
///
/// Only `DENY`/`SAMEORIGIN` and a `frame-ancestors` directive of exactly
/// `'none'` or `'self'` block embedding. A `frame-ancestors` origin list is
/// treated as embeddable.
pub fn classify_headers(x_frame_options: Option<&str>, csp: Option<&str>) -> EmbeddabilityResult {
    let mut can_embed = true;

    if let Some(xfo) = x_frame_options {
        let value = xfo.to_lowercase();
        if value == "deny" || value == "sameorigin" {
            can_embed = false;
        }
    }

    if let Some(policy) = csp {
        if policy.contains("frame-ancestors")
            && (policy.contains("frame-ancestors 'none'")
                || policy.contains("frame-ancestors 'self'"))
        {
            can_embed = false;
        }
    }

    EmbeddabilityResult {
        can_embed,
        x_frame_options: x_frame_options.map(str::to_string),
        csp: csp.map(truncate_csp),
        error: None,
    }
}

/// First 100 characters of the policy, always followed by the marker.
fn truncate_csp(policy: &str) -> String {
    let mut shown: String = policy.chars().take(CSP_DISPLAY_CHARS).collect();
    shown.push_str(CSP_TRUNCATION_MARKER);
    shown
}

/// All values of `name` joined with `", "`, or `None` if the header is absent.
fn header_value(headers: &HeaderMap, name: &HeaderName) -> Option<String> {
    let values: Vec<String> = headers
        .get_all(name)
        .iter()
        .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
        .collect();
    (!values.is_empty()).then(|| values.join(", "))
}

async fn fetch_headers(
    client: &ReqwestClient,
    settings: &FetchSettings,
    target: &Url,
) -> Result<HeaderMap, UpstreamError> {
    check_target(target, settings).await?;
    let response = client.head(target.as_str()).send().await?;
    Ok(response.headers().clone())
}

/// Probe `target` with a HEAD request and classify its framing headers.
///
/// Never fails: transport errors and timeouts yield
/// [`EmbeddabilityResult::failed`].
pub async fn probe_embedding(
    client: &ReqwestClient,
    settings: &FetchSettings,
    target: &Url,
) -> EmbeddabilityResult {
    let probe = tokio::time::timeout(
        settings.embed_check_timeout,
        fetch_headers(client, settings, target),
    )
    .await
    .map_err(|_| UpstreamError::Timeout(settings.embed_check_timeout))
    .and_then(|r| r);

    match probe {
        Ok(headers) => {
            let xfo = header_value(&headers, &X_FRAME_OPTIONS);
            let csp = header_value(&headers, &CONTENT_SECURITY_POLICY);
            let result = classify_headers(xfo.as_deref(), csp.as_deref());
            tracing::debug!(url = %target, can_embed = result.can_embed, "Embedding check complete");
            result
        }
        Err(e) => {
            tracing::warn!(error = %e, url = %target, "Embedding check failed, assuming not embeddable");
            EmbeddabilityResult::failed()
        }
    }
}

/// GET /api/check-embedding?url=<encoded-url>
pub async fn check_embedding(
    State(state): State<AppState>,
    Query(params): Query<TargetQuery>,
) -> AppResult<Json<EmbeddabilityResult>> {
    let url = required_url(&params)?;
    let (target, _) = parse_target(&url)?;
    Ok(Json(
        probe_embedding(&state.http_client, &state.fetch, &target).await,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    #[test]
    fn no_headers_is_embeddable() {
        let result = classify_headers(None, None);
        assert!(result.can_embed);
        assert!(result.x_frame_options.is_none());
        assert!(result.csp.is_none());
        assert!(result.error.is_none());
    }

    #[test]
    fn x_frame_options_deny_and_sameorigin_block_any_case() {
        for value in ["DENY", "deny", "Deny", "SAMEORIGIN", "sameorigin", "SameOrigin"] {
            let result = classify_headers(Some(value), None);
            assert!(!result.can_embed, "{value} should block embedding");
            assert_eq!(result.x_frame_options.as_deref(), Some(value));
        }
    }

    #[test]
    fn x_frame_options_allow_from_does_not_block() {
        assert!(classify_headers(Some("ALLOW-FROM https://example.com"), None).can_embed);
    }

    #[test]
    fn x_frame_options_with_padding_is_not_trimmed() {
        assert!(classify_headers(Some(" deny"), None).can_embed);
    }

    #[test]
    fn frame_ancestors_none_or_self_blocks() {
        assert!(!classify_headers(None, Some("default-src *; frame-ancestors 'none'")).can_embed);
        assert!(!classify_headers(None, Some("frame-ancestors 'self'")).can_embed);
    }

    #[test]
    fn frame_ancestors_origin_list_is_still_embeddable() {
        // Known limitation: only 'none' and 'self' are recognised.
        let csp = "frame-ancestors https://partner.example.com";
        assert!(classify_headers(None, Some(csp)).can_embed);
        assert!(!classify_headers(None, Some("frame-ancestors 'self' https://a.example")).can_embed);
    }

    #[test]
    fn csp_without_frame_ancestors_is_embeddable() {
        assert!(classify_headers(None, Some("default-src 'self'")).can_embed);
    }

    #[test]
    fn long_csp_is_cut_to_100_chars_plus_marker() {
        let csp = "a".repeat(250);
        let shown = classify_headers(None, Some(&csp)).csp.unwrap();
        assert_eq!(shown, format!("{}...", "a".repeat(100)));
        assert_eq!(shown.chars().count(), 103);
    }

    #[test]
    fn short_csp_still_gets_marker() {
        let shown = classify_headers(None, Some("default-src 'self'")).csp.unwrap();
        assert_eq!(shown, "default-src 'self'...");
    }

    #[test]
    fn csp_truncation_respects_char_boundaries() {
        let csp = "é".repeat(150);
        let shown = classify_headers(None, Some(&csp)).csp.unwrap();
        assert_eq!(shown, format!("{}...", "é".repeat(100)));
    }

    #[test]
    fn header_lookup_is_case_insensitive() {
        let mut headers = HeaderMap::new();
        headers.insert(
            HeaderName::from_static("x-frame-options"),
            HeaderValue::from_static("DENY"),
        );
        assert_eq!(
            header_value(&headers, &HeaderName::from_bytes(b"X-FRAME-OPTIONS").unwrap()).as_deref(),
            Some("DENY")
        );
    }

    #[test]
    fn repeated_headers_are_joined() {
        let mut headers = HeaderMap::new();
        headers.append(X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
        headers.append(X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
        assert_eq!(
            header_value(&headers, &X_FRAME_OPTIONS).as_deref(),
            Some("DENY, DENY")
        );
        assert!(header_value(&headers, &CONTENT_SECURITY_POLICY).is_none());
    }

    #[tokio::test]
    async fn blocked_target_fails_closed() {
        let (target, _) = parse_target("http://127.0.0.1:9/").unwrap();
        let result = probe_embedding(&ReqwestClient::new(), &FetchSettings::default(), &target).await;
        assert_eq!(result, EmbeddabilityResult::failed());
    }

    #[tokio::test]
    async fn unreachable_target_fails_closed() {
        let settings = FetchSettings {
            block_private_addresses: false,
            ..FetchSettings::default()
        };
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let (target, _) = parse_target(&format!("http://127.0.0.1:{port}/")).unwrap();
        let result = probe_embedding(&ReqwestClient::new(), &settings, &target).await;
        assert!(!result.can_embed);
        assert_eq!(result.error.as_deref(), Some("Failed to check headers"));
    }
}
