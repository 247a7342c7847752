#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, Uri};
use axum::response::IntoResponse;
use serde_json::Value;
use tokio::net::TcpListener;

use studyhub_ai::api::models::ProxyRequest;
use studyhub_ai::client::{ProxyError, TextGenerator};
use studyhub_ai::config::Config;

pub async fn spawn(router: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

pub fn config_with(pairs: &[(&str, &str)]) -> Config {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    Config::from_lookup(move |key| map.get(key).cloned()).unwrap()
}

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub path: String,
    pub api_key: Option<String>,
    pub body: Value,
}

/// Canned HTTP responder that records what it receives.
#[derive(Clone)]
pub struct Stub {
    status: StatusCode,
    content_type: &'static str,
    body: String,
    delay: Duration,
    pub calls: Arc<Mutex<Vec<RecordedCall>>>,
}

impl Stub {
    pub fn json(status: StatusCode, body: Value) -> Self {
        Self::raw(status, "application/json", body.to_string())
    }

    pub fn raw(status: StatusCode, content_type: &'static str, body: impl Into<String>) -> Self {
        Self {
            status,
            content_type,
            body: body.into(),
            delay: Duration::ZERO,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn last_call(&self) -> RecordedCall {
        self.calls.lock().unwrap().last().cloned().expect("no call recorded")
    }

    /// Serves every path and method with the canned response.
    pub async fn serve(&self) -> SocketAddr {
        spawn(Router::new().fallback(respond).with_state(self.clone())).await
    }
}

async fn respond(State(stub): State<Stub>, uri: Uri, headers: HeaderMap, body: Bytes) -> impl IntoResponse {
    stub.calls.lock().unwrap().push(RecordedCall {
        path: uri.path().to_string(),
        api_key: headers
            .get("x-goog-api-key")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        body: serde_json::from_slice(&body).unwrap_or(Value::Null),
    });
    if !stub.delay.is_zero() {
        tokio::time::sleep(stub.delay).await;
    }
    (
        stub.status,
        [(axum::http::header::CONTENT_TYPE, stub.content_type)],
        stub.body.clone(),
    )
}

/// Scripted generator keyed on which system instruction it receives.
pub struct ScriptedGenerator {
    pub summary: Result<String, String>,
    pub study_plan: Result<String, String>,
    pub flashcards: Result<String, String>,
    pub requests: Mutex<Vec<ProxyRequest>>,
}

impl ScriptedGenerator {
    pub fn ok(summary: &str, study_plan: &str, flashcards: &str) -> Self {
        Self {
            summary: Ok(summary.to_string()),
            study_plan: Ok(study_plan.to_string()),
            flashcards: Ok(flashcards.to_string()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<ProxyRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, request: &ProxyRequest) -> Result<String, ProxyError> {
        self.requests.lock().unwrap().push(request.clone());
        let system = request.system_prompt.clone().unwrap_or_default();
        let scripted = if system.contains("educational planner") {
            &self.study_plan
        } else if system.contains("flashcards") {
            &self.flashcards
        } else {
            &self.summary
        };
        // Let the other calls of a comprehensive run make progress first.
        tokio::task::yield_now().await;
        scripted.clone().map_err(|message| ProxyError::Http {
            status: 500,
            message,
        })
    }
}
