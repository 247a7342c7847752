use reqwest::Client;
use serde::Serialize;

use crate::config::{Config, GenerationParams};
use crate::error::{AppError, Result};

#[derive(Serialize)]
struct Part {
    text: String,
}

#[derive(Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    generation_config: GenerationParams,
}

/// Text plus the untouched provider body.
#[derive(Debug)]
pub struct UpstreamReply {
    pub text: String,
    pub raw: serde_json::Value,
}

/// Merges the optional system instruction into the single user turn the
/// provider receives.
pub fn combine_prompt(prompt: &str, system_prompt: Option<&str>) -> String {
    match system_prompt {
        Some(system) if !system.is_empty() => format!("{}\n\n{}", system, prompt),
        _ => prompt.to_string(),
    }
}

#[tracing::instrument(skip_all, fields(model = %config.gemini_model, prompt_len = prompt.len()))]
pub async fn call_gemini(
    client: &Client,
    config: &Config,
    api_key: &str,
    prompt: &str,
    system_prompt: Option<&str>,
) -> Result<UpstreamReply> {
    let body = GenerateContentRequest {
        contents: vec![Content {
            parts: vec![Part {
                text: combine_prompt(prompt, system_prompt),
            }],
        }],
        generation_config: config.generation,
    };

    let url = format!(
        "{}/models/{}:generateContent",
        config.gemini_base_url, config.gemini_model
    );

    // Key travels in a header so it never shows up in a URL or an error message.
    let res = client
        .post(url)
        .header("x-goog-api-key", api_key)
        .json(&body)
        .send()
        .await?;

    let status = res.status();
    let json: serde_json::Value = if status.is_success() {
        res.json().await?
    } else {
        res.json().await.unwrap_or(serde_json::Value::Null)
    };

    if !status.is_success() {
        let message = json["error"]["message"]
            .as_str()
            .filter(|m| !m.is_empty())
            .unwrap_or("Unknown error")
            .to_string();
        return Err(AppError::Upstream {
            status: status.as_u16(),
            message,
        });
    }

    let text = json["candidates"][0]["content"]["parts"][0]["text"]
        .as_str()
        .unwrap_or_default()
        .to_string();
    tracing::debug!(text_len = text.len(), "upstream generation complete");

    Ok(UpstreamReply { text, raw: json })
}
