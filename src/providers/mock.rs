//! Deterministic provider double for tests and local runs.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use super::{Provider, ProviderOutput};
use crate::errors::ProviderError;
use crate::types::{GroundingSource, Language};

#[derive(Debug, Clone)]
enum Outcome {
    Reply(ProviderOutput),
    Quota,
}

/// Replies with a fixed output (or fails with quota exhaustion) and counts calls.
pub struct MockProvider {
    name: &'static str,
    outcome: Outcome,
    delay: Option<Duration>,
    calls: AtomicUsize,
    last_prompt: Mutex<Option<String>>,
}

impl MockProvider {
    pub fn replying(raw_text: impl Into<String>, sources: Vec<GroundingSource>) -> Self {
        Self::with_outcome(Outcome::Reply(ProviderOutput {
            raw_text: raw_text.into(),
            sources,
        }))
    }

    pub fn failing() -> Self {
        Self::with_outcome(Outcome::Quota)
    }

    fn with_outcome(outcome: Outcome) -> Self {
        Self {
            name: "mock",
            outcome,
            delay: None,
            calls: AtomicUsize::new(0),
            last_prompt: Mutex::new(None),
        }
    }

    pub fn named(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    /// Simulated provider latency (uses tokio time, so paused clocks work).
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_prompt(&self) -> Option<String> {
        match self.last_prompt.lock() {
            Ok(g) => g.clone(),
            Err(poison) => poison.into_inner().clone(),
        }
    }
}

#[async_trait]
impl Provider for MockProvider {
    async fn generate(
        &self,
        _system_instruction: &str,
        prompt: &str,
        _language: Language,
    ) -> Result<ProviderOutput, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut g) = self.last_prompt.lock() {
            *g = Some(prompt.to_string());
        }
        if let Some(d) = self.delay {
            tokio::time::sleep(d).await;
        }
        match &self.outcome {
            Outcome::Reply(out) => Ok(out.clone()),
            Outcome::Quota => Err(ProviderError::QuotaExhausted(
                reqwest::StatusCode::TOO_MANY_REQUESTS,
            )),
        }
    }

    fn name(&self) -> &'static str {
        self.name
    }
}
