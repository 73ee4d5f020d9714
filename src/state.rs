use std::sync::Arc;

use reqwest::Client as ReqwestClient;

use crate::config::FetchSettings;
use crate::store::ClipboardStore;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Shared client for upstream page fetches and embed probes.
    pub http_client: ReqwestClient,
    pub fetch: FetchSettings,
    pub store: Arc<dyn ClipboardStore>,
}
