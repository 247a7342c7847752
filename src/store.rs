//! Persistence port for generated content.
//!
//! Callers pass the user id explicitly; nothing here looks up a session.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::normalize::GenerationResult;
use crate::prompts::GenerationKind;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("User not authenticated")]
    Unauthenticated,

    #[error("Storage failure: {0}")]
    Backend(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredGeneration {
    pub user_id: String,
    pub resource_id: String,
    pub kind: GenerationKind,
    pub created_at: DateTime<Utc>,
    pub result: GenerationResult,
}

#[async_trait]
pub trait GenerationStore: Send + Sync {
    /// Keeps one entry per user, resource and kind; saving again replaces it.
    async fn save(
        &self,
        user_id: &str,
        resource_id: &str,
        result: &GenerationResult,
    ) -> Result<StoredGeneration, StoreError>;

    /// Newest first. `kind` narrows the result when given.
    async fn load(
        &self,
        user_id: &str,
        resource_id: &str,
        kind: Option<GenerationKind>,
    ) -> Result<Vec<StoredGeneration>, StoreError>;
}

#[derive(Default)]
pub struct InMemoryGenerationStore {
    entries: Mutex<HashMap<(String, String, GenerationKind), StoredGeneration>>,
}

impl InMemoryGenerationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn require_user(user_id: &str) -> Result<(), StoreError> {
    if user_id.trim().is_empty() {
        Err(StoreError::Unauthenticated)
    } else {
        Ok(())
    }
}

#[async_trait]
impl GenerationStore for InMemoryGenerationStore {
    async fn save(
        &self,
        user_id: &str,
        resource_id: &str,
        result: &GenerationResult,
    ) -> Result<StoredGeneration, StoreError> {
        require_user(user_id)?;

        let stored = StoredGeneration {
            user_id: user_id.to_string(),
            resource_id: resource_id.to_string(),
            kind: result.kind(),
            created_at: Utc::now(),
            result: result.clone(),
        };

        let mut entries = self
            .entries
            .lock()
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        entries.insert(
            (user_id.to_string(), resource_id.to_string(), stored.kind),
            stored.clone(),
        );
        tracing::debug!(user_id, resource_id, kind = %stored.kind, "generation saved");

        Ok(stored)
    }

    async fn load(
        &self,
        user_id: &str,
        resource_id: &str,
        kind: Option<GenerationKind>,
    ) -> Result<Vec<StoredGeneration>, StoreError> {
        require_user(user_id)?;

        let entries = self
            .entries
            .lock()
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        let mut found: Vec<StoredGeneration> = entries
            .values()
            .filter(|g| g.user_id == user_id && g.resource_id == resource_id)
            .filter(|g| kind.is_none_or(|k| g.kind == k))
            .cloned()
            .collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(found)
    }
}
