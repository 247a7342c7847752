use std::env;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::Serialize;

use crate::error::{AppError, Result};

pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash-exp";
pub const DEFAULT_PROXY_URL: &str = "http://localhost:3000/api/gemini";

/// Sampling parameters sent with every upstream call. Fixed server-side.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationParams {
    pub temperature: f32,
    pub top_k: u32,
    pub top_p: f32,
    pub max_output_tokens: u32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            temperature: 0.5,
            top_k: 40,
            top_p: 0.9,
            max_output_tokens: 4096,
        }
    }
}

/// Proxy server configuration.
#[derive(Clone)]
pub struct Config {
    pub server_addr: SocketAddr,
    /// `None` is a valid startup state: requests are answered with a 500.
    pub gemini_api_key: Option<String>,
    pub gemini_base_url: String,
    pub gemini_model: String,
    pub generation: GenerationParams,
    pub upstream_timeout: Duration,
    pub static_dir: Option<PathBuf>,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("server_addr", &self.server_addr)
            .field("gemini_api_key", &self.gemini_api_key.as_ref().map(|_| "<redacted>"))
            .field("gemini_base_url", &self.gemini_base_url)
            .field("gemini_model", &self.gemini_model)
            .field("generation", &self.generation)
            .field("upstream_timeout", &self.upstream_timeout)
            .field("static_dir", &self.static_dir)
            .finish()
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        // Load environment variables from .env file if it exists
        dotenv::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup("HOST").unwrap_or_else(|| "127.0.0.1".to_string());
        let port = lookup("PORT").unwrap_or_else(|| "3000".to_string());
        let port = port
            .parse::<u16>()
            .map_err(|e| AppError::ConfigError(format!("Invalid port: {}", e)))?;
        let ip = IpAddr::from_str(&host)
            .map_err(|e| AppError::ConfigError(format!("Invalid host address: {}", e)))?;

        let defaults = GenerationParams::default();
        let generation = GenerationParams {
            temperature: parse_or(&lookup, "GEMINI_TEMPERATURE", defaults.temperature)?,
            top_k: parse_or(&lookup, "GEMINI_TOP_K", defaults.top_k)?,
            top_p: parse_or(&lookup, "GEMINI_TOP_P", defaults.top_p)?,
            max_output_tokens: parse_or(
                &lookup,
                "GEMINI_MAX_OUTPUT_TOKENS",
                defaults.max_output_tokens,
            )?,
        };

        Ok(Config {
            server_addr: SocketAddr::new(ip, port),
            gemini_api_key: lookup("GEMINI_API_KEY").filter(|key| !key.trim().is_empty()),
            gemini_base_url: lookup("GEMINI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            gemini_model: lookup("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
            generation,
            upstream_timeout: Duration::from_secs(parse_or(&lookup, "UPSTREAM_TIMEOUT_SECS", 90)?),
            static_dir: lookup("STATIC_DIR").map(PathBuf::from),
        })
    }
}

/// Settings for the pipeline side that talks to the proxy.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub proxy_url: String,
    /// No timeout unless one is configured.
    pub timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            proxy_url: DEFAULT_PROXY_URL.to_string(),
            timeout: None,
        }
    }
}

impl ClientConfig {
    pub fn load() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let timeout = match lookup("AI_PROXY_TIMEOUT_SECS") {
            Some(raw) => Some(Duration::from_secs(raw.parse::<u64>().map_err(|e| {
                AppError::ConfigError(format!("Invalid AI_PROXY_TIMEOUT_SECS: {}", e))
            })?)),
            None => None,
        };

        Ok(ClientConfig {
            proxy_url: lookup("AI_PROXY_URL").unwrap_or_else(|| DEFAULT_PROXY_URL.to_string()),
            timeout,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| AppError::ConfigError(format!("Invalid {}: {}", key, e))),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_without_environment() {
        let config = Config::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.server_addr.to_string(), "127.0.0.1:3000");
        assert!(config.gemini_api_key.is_none());
        assert_eq!(config.gemini_model, DEFAULT_GEMINI_MODEL);
        assert_eq!(config.generation, GenerationParams::default());
        assert_eq!(config.upstream_timeout, Duration::from_secs(90));
        assert!(config.static_dir.is_none());
    }

    #[test]
    fn blank_api_key_counts_as_missing() {
        let config = Config::from_lookup(lookup_from(&[("GEMINI_API_KEY", "  ")])).unwrap();
        assert!(config.gemini_api_key.is_none());
    }

    #[test]
    fn overrides_are_applied() {
        let config = Config::from_lookup(lookup_from(&[
            ("HOST", "0.0.0.0"),
            ("PORT", "8080"),
            ("GEMINI_API_KEY", "secret"),
            ("GEMINI_BASE_URL", "http://127.0.0.1:9000/v1beta/"),
            ("GEMINI_TOP_K", "20"),
        ]))
        .unwrap();
        assert_eq!(config.server_addr.port(), 8080);
        assert_eq!(config.gemini_api_key.as_deref(), Some("secret"));
        assert_eq!(config.gemini_base_url, "http://127.0.0.1:9000/v1beta");
        assert_eq!(config.generation.top_k, 20);
    }

    #[test]
    fn invalid_port_is_a_config_error() {
        let err = Config::from_lookup(lookup_from(&[("PORT", "http")])).unwrap_err();
        assert!(matches!(err, AppError::ConfigError(_)));
    }

    #[test]
    fn debug_output_redacts_the_key() {
        let config = Config::from_lookup(lookup_from(&[("GEMINI_API_KEY", "top-secret")])).unwrap();
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("top-secret"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn client_config_reads_url_and_timeout() {
        let config = ClientConfig::from_lookup(lookup_from(&[
            ("AI_PROXY_URL", "http://10.0.0.2:3000/api/gemini"),
            ("AI_PROXY_TIMEOUT_SECS", "30"),
        ]))
        .unwrap();
        assert_eq!(config.proxy_url, "http://10.0.0.2:3000/api/gemini");
        assert_eq!(config.timeout, Some(Duration::from_secs(30)));

        let defaults = ClientConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(defaults.proxy_url, DEFAULT_PROXY_URL);
        assert!(defaults.timeout.is_none());
    }
}
