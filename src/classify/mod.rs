//! LLM classification of scraped profiles
//!
//! The classification collaborator consumes a profile's name and free-text
//! body and returns a structured `{theme, tags, rationale}` mapping. The
//! orchestrator schedules collaborator calls with bounded retry, validates
//! the mapping, and stores the triple; the collaborator itself never
//! retries.

mod openai;
mod orchestrator;

pub use openai::OpenAiClassifier;
pub use orchestrator::{ClassificationOrchestrator, ClassificationSummary};

use crate::{AtlasError, Result};
use async_trait::async_trait;
use serde_json::Value;

/// A stored classification triple
///
/// The three fields are always written together; a profile either carries a
/// complete classification or none at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub theme: String,
    pub tags: Vec<String>,
    pub rationale: String,
}

/// The external classification collaborator
///
/// Returns the raw structured mapping; validation is the orchestrator's job.
#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(&self, name: &str, body: &str) -> anyhow::Result<Value>;
}

/// Validates a collaborator response into a [`Classification`]
///
/// The response must be a JSON object with a string `theme`, a string array
/// `tags`, and a string `rationale`; anything else fails validation and
/// feeds the orchestrator's retry loop. Tags are deduplicated preserving
/// order.
pub fn validate_classification(value: &Value) -> Result<Classification> {
    let map = value.as_object().ok_or_else(|| {
        AtlasError::ClassificationValidation("response is not a JSON object".to_string())
    })?;

    let theme = map
        .get("theme")
        .and_then(Value::as_str)
        .ok_or_else(|| {
            AtlasError::ClassificationValidation("missing or non-string `theme`".to_string())
        })?
        .to_string();

    let raw_tags = map.get("tags").and_then(Value::as_array).ok_or_else(|| {
        AtlasError::ClassificationValidation("missing or non-array `tags`".to_string())
    })?;

    let mut tags: Vec<String> = Vec::new();
    for tag in raw_tags {
        let tag = tag.as_str().ok_or_else(|| {
            AtlasError::ClassificationValidation("non-string entry in `tags`".to_string())
        })?;
        if !tags.iter().any(|t| t == tag) {
            tags.push(tag.to_string());
        }
    }

    let rationale = map
        .get("rationale")
        .and_then(Value::as_str)
        .ok_or_else(|| {
            AtlasError::ClassificationValidation("missing or non-string `rationale`".to_string())
        })?
        .to_string();

    Ok(Classification {
        theme,
        tags,
        rationale,
    })
}
