use std::time::Duration;

use bytes::Bytes;
use once_cell::sync::Lazy;
use reqwest::{Client, ClientBuilder, Url, header};

// Create a static client to reuse connections
static CLIENT: Lazy<Client> = Lazy::new(|| {
    ClientBuilder::new()
        .timeout(Duration::from_secs(120))
        .connect_timeout(Duration::from_secs(10))
        .pool_max_idle_per_host(10)
        .build()
        .unwrap_or_default()
});

pub const DEFAULT_MEDIA_TYPE: &str = "application/octet-stream";

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Failed to fetch resource content ({status})")]
    Status { status: u16 },

    #[error("Failed to fetch resource content: {0}")]
    Transport(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        FetchError::Transport(err.to_string())
    }
}

/// A downloaded resource held in memory.
#[derive(Debug, Clone)]
pub struct FetchedResource {
    pub data: Bytes,
    pub media_type: String,
}

#[tracing::instrument]
pub async fn fetch_resource(url: &str) -> Result<FetchedResource, FetchError> {
    let response = CLIENT.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status {
            status: status.as_u16(),
        });
    }

    let media_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.split(';').next().unwrap_or(v).trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| DEFAULT_MEDIA_TYPE.to_string());
    let data = response.bytes().await?;
    tracing::debug!(bytes = data.len(), %media_type, "resource downloaded");

    Ok(FetchedResource { data, media_type })
}

/// Filename for a downloaded resource: the title when given, otherwise the
/// last path segment of the URL, otherwise `resource`.
pub fn resource_filename(url: &str, title: &str) -> String {
    if !title.is_empty() {
        return title.to_string();
    }

    let from_path = match Url::parse(url) {
        Ok(parsed) => parsed
            .path_segments()
            .and_then(|mut segments| segments.next_back().map(str::to_string)),
        Err(_) => url.rsplit('/').next().map(str::to_string),
    };

    from_path
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| "resource".to_string())
}
