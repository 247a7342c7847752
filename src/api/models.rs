use serde::{Deserialize, Deserializer, Serialize};

/// Body of `POST /api/gemini`. Never carries a provider credential.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyRequest {
    pub prompt: String,
    #[serde(default)]
    pub system_prompt: Option<String>,
}

impl ProxyRequest {
    pub fn new(prompt: impl Into<String>, system_prompt: Option<String>) -> Self {
        Self {
            prompt: prompt.into(),
            system_prompt,
        }
    }
}

/// Successful proxy reply. `raw` is the provider body, passed through untouched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxyReply {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub text: String,
    #[serde(default)]
    pub raw: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reply_text_tolerates_null_and_absence() {
        for body in [r#"{"text": null, "raw": {}}"#, r#"{"raw": {}}"#] {
            let reply: ProxyReply = serde_json::from_str(body).unwrap();
            assert_eq!(reply.text, "", "body {}", body);
        }
    }
}
