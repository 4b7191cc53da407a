//! Data models and structures
//!
//! Defines the inbound analysis request sent by the browser client and the
//! relay configuration read from the environment.

use serde::Deserialize;
use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash-preview-05-20";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8888";

/// Body posted by the browser client.
///
/// `base64ImageDataBack` is only sent for two-sided items (a coin's reverse);
/// the client sends `null` or omits it otherwise.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    /// Missing or `null` is forwarded as an empty text part.
    #[serde(default)]
    pub prompt: Option<String>,
    pub base64_image_data_front: String,
    #[serde(default)]
    pub base64_image_data_back: Option<String>,
}

impl AnalyzeRequest {
    /// The back image, if the client sent a non-empty one.
    pub fn back_image(&self) -> Option<&str> {
        self.base64_image_data_back
            .as_deref()
            .filter(|data| !data.is_empty())
    }
}

// Configuration
#[derive(Clone)]
pub struct Config {
    /// Missing is not a startup error; every invocation reports it instead.
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub gemini_base_url: String,
    pub upstream_timeout: Option<Duration>,
    pub bind_addr: SocketAddr,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field(
                "gemini_api_key",
                &self.gemini_api_key.as_ref().map(|_| "<redacted>"),
            )
            .field("gemini_model", &self.gemini_model)
            .field("gemini_base_url", &self.gemini_base_url)
            .field("upstream_timeout", &self.upstream_timeout)
            .field("bind_addr", &self.bind_addr)
            .finish()
    }
}

impl Config {
    pub fn from_env() -> crate::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> crate::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let upstream_timeout = match lookup("GEMINI_TIMEOUT_SECS") {
            Some(raw) => {
                let secs: u64 = raw.trim().parse().map_err(|_| {
                    crate::Error::Config(format!("GEMINI_TIMEOUT_SECS is not a number: {}", raw))
                })?;
                Some(Duration::from_secs(secs))
            }
            None => None,
        };

        let bind_raw = lookup("RELAY_BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr: SocketAddr = bind_raw.parse().map_err(|_| {
            crate::Error::Config(format!("RELAY_BIND_ADDR is not a socket address: {}", bind_raw))
        })?;

        Ok(Self {
            gemini_api_key: lookup("GEMINI_API_KEY").filter(|key| !key.is_empty()),
            gemini_model: lookup("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            gemini_base_url: lookup("GEMINI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            upstream_timeout,
            bind_addr,
        })
    }
}
