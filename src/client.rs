use async_trait::async_trait;
use reqwest::Client;

use crate::api::models::{ErrorBody, ProxyReply, ProxyRequest};
use crate::config::ClientConfig;

#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    #[error("Prompt is required")]
    MissingPrompt,

    #[error("Proxy unreachable: {0}")]
    Unreachable(String),

    #[error("Proxy request timed out")]
    Timeout,

    /// Displays only the message so callers see the proxy's own wording.
    #[error("{message}")]
    Http { status: u16, message: String },

    #[error("Invalid proxy response: {0}")]
    InvalidBody(String),

    #[error("No response generated")]
    NoResponseGenerated,
}

impl ProxyError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ProxyError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ProxyError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ProxyError::Timeout
        } else if err.is_decode() {
            ProxyError::InvalidBody(err.to_string())
        } else {
            ProxyError::Unreachable(err.to_string())
        }
    }
}

/// Anything that turns a prompt pair into generated text.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, request: &ProxyRequest) -> Result<String, ProxyError>;
}

/// Talks to the local `/api/gemini` proxy. One attempt per call.
#[derive(Debug, Clone)]
pub struct ProxyClient {
    http: Client,
    endpoint: String,
}

impl ProxyClient {
    pub fn new(config: &ClientConfig) -> Result<Self, ProxyError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build()?;

        Ok(Self {
            http,
            endpoint: config.proxy_url.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    #[tracing::instrument(skip_all, fields(endpoint = %self.endpoint, prompt_len = request.prompt.len()))]
    pub async fn send(&self, request: &ProxyRequest) -> Result<String, ProxyError> {
        if request.prompt.is_empty() {
            return Err(ProxyError::MissingPrompt);
        }

        let response = self.http.post(&self.endpoint).json(request).send().await?;
        let status = response.status();

        if !status.is_success() {
            let message = response
                .json::<ErrorBody>()
                .await
                .ok()
                .map(|body| body.error)
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| format!("Proxy error: {}", status.as_u16()));
            tracing::warn!(status = status.as_u16(), %message, "proxy returned an error");
            return Err(ProxyError::Http {
                status: status.as_u16(),
                message,
            });
        }

        let reply: ProxyReply = response.json().await?;
        if reply.text.is_empty() {
            return Err(ProxyError::NoResponseGenerated);
        }
        Ok(reply.text)
    }
}

#[async_trait]
impl TextGenerator for ProxyClient {
    async fn generate(&self, request: &ProxyRequest) -> Result<String, ProxyError> {
        self.send(request).await
    }
}
