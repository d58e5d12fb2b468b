use std::env;
use std::str::FromStr;
use std::time::Duration;
use dotenv::dotenv;

use crate::error::ClientError;

#[derive(Debug, Clone)]
pub struct Config {
    // API
    pub api_base_url: String,
    pub request_timeout_secs: u64,
    pub auth_token: Option<String>,

    // Cache
    pub cache_ttl_secs: u64,

    // Stream
    pub sse_retry_ms: u64,

    // Map
    pub marker_fly_zoom: f64,
    pub area_focus_zoom: f64,

    // Page
    pub scroll_lock_delay_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8080".to_string(),
            request_timeout_secs: 10,
            auth_token: None,
            cache_ttl_secs: 300,
            sse_retry_ms: 3000,
            marker_fly_zoom: 16.0,
            area_focus_zoom: 14.0,
            scroll_lock_delay_ms: 100,
        }
    }
}

impl Config {
    pub fn new() -> Result<Self, ClientError> {
        // .env 파일 로드
        dotenv().ok();

        let defaults = Self::default();

        let api_base_url = env::var("API_BASE_URL")
            .unwrap_or(defaults.api_base_url)
            .trim_end_matches('/')
            .to_string();
        if !api_base_url.starts_with("http://") && !api_base_url.starts_with("https://") {
            return Err(ClientError::Config(format!(
                "API_BASE_URL must start with http:// or https:// ({})",
                api_base_url
            )));
        }

        Ok(Self {
            // API
            api_base_url,
            request_timeout_secs: env_or("REQUEST_TIMEOUT_SECS", defaults.request_timeout_secs),
            auth_token: env::var("AUTH_TOKEN").ok().filter(|token| !token.trim().is_empty()),

            // Cache
            cache_ttl_secs: env_or("CACHE_TTL_SECS", defaults.cache_ttl_secs),

            // Stream
            sse_retry_ms: env_or("SSE_RETRY_MS", defaults.sse_retry_ms),

            // Map
            marker_fly_zoom: env_or("MARKER_FLY_ZOOM", defaults.marker_fly_zoom),
            area_focus_zoom: env_or("AREA_FOCUS_ZOOM", defaults.area_focus_zoom),

            // Page
            scroll_lock_delay_ms: env_or("SCROLL_LOCK_DELAY_MS", defaults.scroll_lock_delay_ms),
        })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn sse_retry(&self) -> Duration {
        Duration::from_millis(self.sse_retry_ms)
    }

    pub fn scroll_lock_delay(&self) -> Duration {
        Duration::from_millis(self.scroll_lock_delay_ms)
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(default)
}
