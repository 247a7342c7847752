use axum::Json;
use axum::http::StatusCode;

use crate::api::models::{ErrorBody, ProxyReply};

pub fn success(text: String, raw: serde_json::Value) -> (StatusCode, Json<ProxyReply>) {
    (StatusCode::OK, Json(ProxyReply { text, raw }))
}

pub fn error(status: StatusCode, message: String) -> (StatusCode, Json<ErrorBody>) {
    (status, Json(ErrorBody { error: message }))
}
