// src/providers/mod.rs
//! Provider abstraction: "generate highlights given a prompt and instructions".
//!
//! The orchestrator only sees [`Provider`]; concrete HTTP adapters live in the
//! submodules and are built only when their credentials are present.

pub mod gemini;
pub mod mock;
pub mod openai;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;

use crate::errors::ProviderError;
use crate::types::{GroundingSource, Language};

pub use gemini::GeminiProvider;
pub use mock::MockProvider;
pub use openai::OpenAiProvider;

const USER_AGENT: &str = concat!("highlight-feed/", env!("CARGO_PKG_VERSION"));

/// Raw provider answer before normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderOutput {
    pub raw_text: String,
    /// Grounding citations; empty when the provider did not ground the answer.
    pub sources: Vec<GroundingSource>,
}

impl ProviderOutput {
    pub fn text_only(raw_text: impl Into<String>) -> Self {
        Self {
            raw_text: raw_text.into(),
            sources: Vec::new(),
        }
    }
}

#[async_trait]
pub trait Provider: Send + Sync {
    async fn generate(
        &self,
        system_instruction: &str,
        prompt: &str,
        language: Language,
    ) -> Result<ProviderOutput, ProviderError>;

    /// Provider name for diagnostics/metrics labels.
    fn name(&self) -> &'static str;
}

pub type DynProvider = Arc<dyn Provider>;

/// Shared reqwest client setup for provider adapters.
pub(crate) fn http_client(timeout: Duration) -> reqwest::Client {
    match reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .connect_timeout(Duration::from_secs(5))
        .timeout(timeout)
        .build()
    {
        Ok(client) => client,
        Err(e) => {
            tracing::warn!(
                target: "provider",
                error = %e,
                timeout_secs = timeout.as_secs(),
                "http client build failed; using default client without request timeout"
            );
            reqwest::Client::new()
        }
    }
}

/// Maps non-success HTTP responses onto [`ProviderError`].
pub(crate) async fn ensure_success(
    resp: reqwest::Response,
) -> Result<reqwest::Response, ProviderError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(ProviderError::QuotaExhausted(status));
    }
    let body = resp.text().await.unwrap_or_default();
    Err(ProviderError::StatusCode(status, truncate(&body, 300)))
}

fn truncate(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(status: u16, body: &'static str) -> reqwest::Response {
        axum::http::Response::builder()
            .status(status)
            .body(body)
            .unwrap()
            .into()
    }

    #[test]
    fn http_client_builds_with_configured_timeout() {
        // Ok path; a build failure would log and fall back instead of panicking
        let _client = http_client(Duration::from_secs(7));
    }

    #[tokio::test]
    async fn too_many_requests_maps_to_quota() {
        let err = ensure_success(response(429, "slow down")).await.unwrap_err();
        assert!(matches!(err, ProviderError::QuotaExhausted(s) if s.as_u16() == 429));
    }

    #[tokio::test]
    async fn other_failures_keep_truncated_body() {
        let err = ensure_success(response(500, "boom")).await.unwrap_err();
        match err {
            ProviderError::StatusCode(s, body) => {
                assert_eq!(s.as_u16(), 500);
                assert_eq!(body, "boom");
            }
            other => panic!("expected StatusCode, got {other:?}"),
        }
        assert!(ensure_success(response(200, "{}")).await.is_ok());
    }
}
