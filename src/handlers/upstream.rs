//! Shared plumbing for the outbound fetches made by the link handlers.

use std::net::IpAddr;

use reqwest::Client as ReqwestClient;
use url::Url;

use crate::config::FetchSettings;
use crate::error::{AppError, AppResult, UpstreamError};

pub const USER_AGENT: &str = "Mozilla/5.0 (compatible; LinkPreview/1.0)";
const MAX_REDIRECTS: usize = 10;

/// Build the client shared by every upstream request. Timeouts are applied per
/// request since the two endpoints use different bounds.
pub fn build_http_client() -> reqwest::Result<ReqwestClient> {
    ReqwestClient::builder()
        .user_agent(USER_AGENT)
        .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
        .build()
}

/// Raw query pairs for `/api/link-preview` and `/api/check-embedding`.
/// Kept as pairs so a repeated `url` does not fail deserialization.
pub type TargetQuery = Vec<(String, String)>;

/// The first `url` value wins. An absent or empty one is a caller error.
pub fn required_url(params: &[(String, String)]) -> AppResult<String> {
    params
        .iter()
        .find(|(key, _)| key == "url")
        .map(|(_, value)| value.clone())
        .filter(|u| !u.is_empty())
        .ok_or_else(|| AppError::Validation("URL parameter is required".into()))
}

/// Parse a caller-supplied target. Anything that is not an absolute URL with a
/// host cannot even produce a fallback domain and is rejected.
pub fn parse_target(raw: &str) -> AppResult<(Url, String)> {
    let parsed = Url::parse(raw).map_err(|_| AppError::Validation("Invalid URL".into()))?;
    let domain = parsed
        .host_str()
        .filter(|h| !h.is_empty())
        .ok_or_else(|| AppError::Validation("Invalid URL".into()))?
        .to_string();
    Ok((parsed, domain))
}

/// Returns `true` if `ip` is loopback, private, link-local, or otherwise not
/// a public unicast address.
pub fn is_private_ip(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            v4.is_loopback()
                || v4.is_private()
                || v4.is_link_local()
                || v4.is_unspecified()
                || v4.is_broadcast()
                || v4.octets()[0] == 0
        }
        IpAddr::V6(v6) => {
            if let Some(mapped) = v6.to_ipv4_mapped() {
                return is_private_ip(IpAddr::V4(mapped));
            }
            let first = v6.segments()[0];
            v6.is_loopback()
                || v6.is_unspecified()
                || (first & 0xfe00 == 0xfc00)
                || (first & 0xffc0 == 0xfe80)
        }
    }
}

/// Check the scheme and, when enabled, that the host does not resolve to an
/// internal address.
pub async fn check_target(target: &Url, settings: &FetchSettings) -> Result<(), UpstreamError> {
    match target.scheme() {
        "http" | "https" => {}
        other => return Err(UpstreamError::UnsupportedScheme(other.to_string())),
    }

    if !settings.block_private_addresses {
        return Ok(());
    }

    let host = target.host_str().unwrap_or_default();
    let port = target.port_or_known_default().unwrap_or(80);
    let addrs = tokio::net::lookup_host((host.trim_matches(|c| c == '[' || c == ']'), port))
        .await
        .map_err(UpstreamError::Resolve)?;

    for addr in addrs {
        if is_private_ip(addr.ip()) {
            return Err(UpstreamError::Blocked);
        }
    }
    Ok(())
}
