// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! LLM service contract
//!
//! The engine guarantees only the singleton lifecycle (via the service
//! container) and graceful degradation when the client is unavailable.
//! Batching, caching, and provider details are private to implementations.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from LLM completion calls
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("provider error ({status}): {message}")]
    Provider { status: u16, message: String },
    #[error("response decode error: {0}")]
    Decode(String),
}

/// A single completion request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmRequest {
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    /// JSON schema the response text must conform to, for providers that
    /// support structured output. Validation is the caller's concern.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_schema: Option<serde_json::Value>,
}

impl LlmRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            system: None,
            max_tokens: None,
            response_schema: None,
        }
    }

    pub fn with_response_schema(mut self, schema: serde_json::Value) -> Self {
        self.response_schema = Some(schema);
        self
    }
}

/// A completion result with optional usage accounting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmResponse {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_tokens: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_tokens: Option<u64>,
}

/// Completion client resolved from the service container as a singleton
/// `Arc<dyn LlmClient>`. Implementations must be safe to share across
/// worker threads.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, request: LlmRequest) -> Result<LlmResponse, LlmError>;

    /// Batch completion; the default issues requests sequentially.
    async fn complete_batch(
        &self,
        requests: Vec<LlmRequest>,
    ) -> Result<Vec<LlmResponse>, LlmError> {
        let mut responses = Vec::with_capacity(requests.len());
        for request in requests {
            responses.push(self.complete(request).await?);
        }
        Ok(responses)
    }
}
