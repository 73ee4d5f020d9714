use std::env;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_PREVIEW_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_EMBED_CHECK_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_PREVIEW_MAX_BODY_BYTES: usize = 1024 * 1024;
pub const DEFAULT_MAX_ITEMS: usize = 1000;

#[derive(Clone, Debug)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    pub is_dev: bool,
    pub preview_timeout: Duration,
    pub embed_check_timeout: Duration,
    pub preview_max_body_bytes: usize,
    pub block_private_addresses: bool,
    pub max_items: usize,
}

/// Knobs for outbound fetches, copied into `AppState` so handlers never
/// re-read the environment.
#[derive(Clone, Debug)]
pub struct FetchSettings {
    pub preview_timeout: Duration,
    pub embed_check_timeout: Duration,
    pub preview_max_body_bytes: usize,
    pub block_private_addresses: bool,
}

impl Default for FetchSettings {
    fn default() -> Self {
        FetchSettings {
            preview_timeout: DEFAULT_PREVIEW_TIMEOUT,
            embed_check_timeout: DEFAULT_EMBED_CHECK_TIMEOUT,
            preview_max_body_bytes: DEFAULT_PREVIEW_MAX_BODY_BYTES,
            block_private_addresses: true,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Config {
            server_host: env::var("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            server_port: parse_or("SERVER_PORT", 8080),
            is_dev: env::var("APP_ENV").as_deref() != Ok("production"),
            preview_timeout: Duration::from_secs(parse_or(
                "PREVIEW_TIMEOUT_SECS",
                DEFAULT_PREVIEW_TIMEOUT.as_secs(),
            )),
            embed_check_timeout: Duration::from_secs(parse_or(
                "EMBED_CHECK_TIMEOUT_SECS",
                DEFAULT_EMBED_CHECK_TIMEOUT.as_secs(),
            )),
            preview_max_body_bytes: parse_or(
                "PREVIEW_MAX_BODY_BYTES",
                DEFAULT_PREVIEW_MAX_BODY_BYTES,
            ),
            block_private_addresses: parse_or("BLOCK_PRIVATE_ADDRESSES", true),
            max_items: parse_or("MAX_ITEMS", DEFAULT_MAX_ITEMS),
        }
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }

    pub fn fetch_settings(&self) -> FetchSettings {
        FetchSettings {
            preview_timeout: self.preview_timeout,
            embed_check_timeout: self.embed_check_timeout,
            preview_max_body_bytes: self.preview_max_body_bytes,
            block_private_addresses: self.block_private_addresses,
        }
    }
}

/// Read `key` and parse it, falling back to `default` when unset or malformed.
fn parse_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}
