// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP LLM client and its container factory
//!
//! The factory reports itself unavailable when no API key is configured,
//! so LLM-backed analysers degrade gracefully instead of failing the run.

use async_trait::async_trait;
use dm_core::{LlmClient, LlmError, LlmRequest, LlmResponse, ServiceError, ServiceFactory};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Environment variable holding the API key; absence disables the service.
pub const LLM_API_KEY_ENV: &str = "DM_LLM_API_KEY";
const BASE_URL_ENV: &str = "DM_LLM_BASE_URL";
const MODEL_ENV: &str = "DM_LLM_MODEL";
const DEFAULT_BASE_URL: &str = "https://llm.internal.example.com";
const DEFAULT_MODEL: &str = "dm-analysis-1";

/// Completion client speaking the internal gateway's JSON shape.
pub struct HttpLlmClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
}

#[derive(Serialize)]
struct CompleteRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_schema: Option<&'a serde_json::Value>,
}

#[derive(Deserialize)]
struct CompleteResponse {
    text: String,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct Usage {
    #[serde(default)]
    input_tokens: Option<u64>,
    #[serde(default)]
    output_tokens: Option<u64>,
}

#[async_trait]
impl LlmClient for HttpLlmClient {
    async fn complete(&self, request: LlmRequest) -> Result<LlmResponse, LlmError> {
        let body = CompleteRequest {
            model: &self.model,
            prompt: &request.prompt,
            system: request.system.as_deref(),
            max_tokens: request.max_tokens,
            response_schema: request.response_schema.as_ref(),
        };
        let response = self
            .http
            .post(format!("{}/v1/complete", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|err| LlmError::Transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(LlmError::Provider {
                status: status.as_u16(),
                message,
            });
        }

        let decoded: CompleteResponse = response
            .json()
            .await
            .map_err(|err| LlmError::Decode(err.to_string()))?;
        Ok(LlmResponse {
            text: decoded.text,
            input_tokens: decoded.usage.as_ref().and_then(|usage| usage.input_tokens),
            output_tokens: decoded.usage.as_ref().and_then(|usage| usage.output_tokens),
        })
    }
}

/// Singleton factory for `Arc<dyn LlmClient>`.
///
/// Configuration comes from the environment at construction:
/// `DM_LLM_API_KEY` (required for availability), `DM_LLM_BASE_URL`,
/// `DM_LLM_MODEL`.
pub struct LlmClientFactory {
    base_url: String,
    model: String,
}

impl LlmClientFactory {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            model: model.into(),
        }
    }

    /// Factory configured from the environment.
    pub fn from_env() -> Self {
        Self {
            base_url: std::env::var(BASE_URL_ENV)
                .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            model: std::env::var(MODEL_ENV).unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
        }
    }
}

impl Default for LlmClientFactory {
    fn default() -> Self {
        Self::from_env()
    }
}

impl ServiceFactory<Arc<dyn LlmClient>> for LlmClientFactory {
    fn can_create(&self) -> bool {
        std::env::var(LLM_API_KEY_ENV).is_ok_and(|key| !key.is_empty())
    }

    fn create(&self) -> Result<Arc<dyn LlmClient>, ServiceError> {
        let api_key = std::env::var(LLM_API_KEY_ENV)
            .map_err(|_| ServiceError::Creation(format!("{LLM_API_KEY_ENV} is not set")))?;
        let http = reqwest::Client::builder()
            .build()
            .map_err(|err| ServiceError::Creation(err.to_string()))?;
        Ok(Arc::new(HttpLlmClient {
            http,
            base_url: self.base_url.trim_end_matches('/').to_string(),
            model: self.model.clone(),
            api_key,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dm_core::{Lifetime, ServiceContainer};
    use serial_test::serial;

    #[test]
    #[serial(env)]
    fn factory_is_unavailable_without_api_key() {
        std::env::remove_var(LLM_API_KEY_ENV);
        let factory = LlmClientFactory::new("https://gateway", "model");
        assert!(!factory.can_create());

        let mut container = ServiceContainer::new();
        container.register(Lifetime::Singleton, factory);
        let client: Option<Arc<dyn LlmClient>> = container.get().unwrap();
        assert!(client.is_none());
    }

    #[test]
    #[serial(env)]
    fn factory_resolves_as_singleton_with_api_key() {
        std::env::set_var(LLM_API_KEY_ENV, "test-key");
        let mut container = ServiceContainer::new();
        container.register(
            Lifetime::Singleton,
            LlmClientFactory::new("https://gateway/", "model"),
        );

        let first: Arc<dyn LlmClient> = container.get().unwrap().unwrap();
        let second: Arc<dyn LlmClient> = container.get().unwrap().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        std::env::remove_var(LLM_API_KEY_ENV);
    }
}
