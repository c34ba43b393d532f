// src/pipeline.rs
//! Fallback orchestrator: cache → primary → secondary → stale cache → static.
//!
//! `acquire` is total. Every failure is absorbed here and expressed through
//! `NewsResponse::status`; callers never see an error.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use metrics::{counter, describe_counter, describe_gauge, gauge};
use once_cell::sync::OnceCell;
use tokio::sync::Mutex as AsyncMutex;

use crate::cache::{CacheEntry, HighlightCache, DEFAULT_CACHE_TTL};
use crate::config::PipelineConfig;
use crate::errors::{PipelineError, PipelineResult};
use crate::fallback::{configuration_highlight, static_fallback};
use crate::normalize::{audit_bangladesh, check_request, normalize};
use crate::prompt::{build_prompt, fingerprint, system_instruction};
use crate::providers::{DynProvider, GeminiProvider, OpenAiProvider, Provider};
use crate::status::resolve;
use crate::types::{Acquired, FeedStatus, Highlight, Language};

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "highlights_acquire_total",
            "Acquisitions by terminal outcome (cache|primary|secondary|stale|static)."
        );
        describe_counter!(
            "highlights_provider_failures_total",
            "Provider calls that failed or returned unusable output."
        );
        describe_counter!(
            "highlights_malformed_total",
            "Provider payloads rejected by the normalizer."
        );
        describe_counter!(
            "highlights_cache_corrupt_total",
            "Cache records discarded as unreadable."
        );
        describe_counter!(
            "highlights_bangladesh_mismatch_total",
            "OK responses without exactly one bangladesh highlight."
        );
        describe_gauge!("highlights_cache_ttl_secs", "Configured cache freshness window.");
        describe_counter!(
            "highlights_refresh_runs_total",
            "Completed background refresh passes."
        );
        describe_gauge!(
            "highlights_refresh_last_run_ts",
            "Unix time of the last refresh pass."
        );
    });
}

fn record_outcome(outcome: &'static str, language: Language) {
    counter!("highlights_acquire_total", "outcome" => outcome).increment(1);
    tracing::info!(target: "pipeline", %language, outcome, "highlights acquired");
}

pub struct HighlightPipeline {
    cache: Arc<dyn HighlightCache>,
    primary: Option<DynProvider>,
    secondary: Option<DynProvider>,
    ttl: Duration,
    flights: Mutex<HashMap<Language, Arc<AsyncMutex<()>>>>,
}

impl HighlightPipeline {
    /// A pipeline with no providers configured; add them with the builders.
    pub fn new(cache: Arc<dyn HighlightCache>) -> Self {
        Self {
            cache,
            primary: None,
            secondary: None,
            ttl: DEFAULT_CACHE_TTL,
            flights: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_primary(mut self, provider: DynProvider) -> Self {
        self.primary = Some(provider);
        self
    }

    pub fn with_secondary(mut self, provider: DynProvider) -> Self {
        self.secondary = Some(provider);
        self
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Build providers for whichever credentials are present.
    pub fn from_config(cfg: &PipelineConfig, cache: Arc<dyn HighlightCache>) -> Self {
        let mut pipeline = Self::new(cache).with_ttl(cfg.cache_ttl());

        if cfg.primary.has_credentials() {
            pipeline = pipeline.with_primary(Arc::new(GeminiProvider::new(
                cfg.primary.api_key.trim(),
                cfg.primary.model.as_deref(),
                cfg.primary.base_url.as_deref(),
                cfg.primary.timeout(),
            )));
        }
        if cfg.secondary.has_credentials() {
            pipeline = pipeline.with_secondary(Arc::new(OpenAiProvider::new(
                cfg.secondary.api_key.trim(),
                cfg.secondary.model.as_deref(),
                cfg.secondary.base_url.as_deref(),
                cfg.secondary.timeout(),
            )));
        }

        tracing::info!(
            target: "pipeline",
            primary = pipeline.primary.is_some(),
            secondary = pipeline.secondary.is_some(),
            ttl_secs = pipeline.ttl.as_secs(),
            "highlight pipeline configured"
        );
        pipeline
    }

    pub fn has_primary(&self) -> bool {
        self.primary.is_some()
    }

    /// Acquire highlights for `language`. Never fails.
    ///
    /// Overlapping calls for the same language are coalesced: the follower
    /// waits for the leader, then usually finds a fresh cache entry.
    pub async fn acquire(&self, language: Language, previous: &[Highlight]) -> Acquired {
        ensure_metrics_described();
        gauge!("highlights_cache_ttl_secs").set(self.ttl.as_secs() as f64);

        let gate = self.flight(language);
        let _turn = gate.lock().await;
        self.run_chain(language, previous).await
    }

    fn flight(&self, language: Language) -> Arc<AsyncMutex<()>> {
        let mut g = match self.flights.lock() {
            Ok(g) => g,
            Err(poison) => poison.into_inner(),
        };
        g.entry(language).or_default().clone()
    }

    async fn run_chain(&self, language: Language, previous: &[Highlight]) -> Acquired {
        let now = Utc::now();

        // 1) cache
        let cached = self.cache.get().await;
        if let Some(entry) = &cached {
            if entry.is_fresh_for(language, now, self.ttl) {
                record_outcome("cache", language);
                return Acquired {
                    data: entry.data.clone(),
                    sources: entry.sources.clone(),
                };
            }
        }

        let instruction = system_instruction(language);
        let prompt = build_prompt(now, language, previous);
        let prompt_id = fingerprint(&prompt);

        // 2-3) primary
        match &self.primary {
            Some(primary) => {
                match self
                    .attempt(primary.as_ref(), &instruction, &prompt, language, previous)
                    .await
                {
                    Ok(acquired) => {
                        self.store(&acquired, language).await;
                        record_outcome("primary", language);
                        return acquired;
                    }
                    Err(e) => {
                        tracing::warn!(target: "pipeline", provider = primary.name(), %prompt_id, error = %e, "primary provider failed");
                    }
                }
            }
            None => {
                tracing::warn!(target: "pipeline", %language, "primary provider not configured; skipping");
            }
        }

        // 4) secondary (never grounds)
        if let Some(secondary) = &self.secondary {
            match self
                .attempt(secondary.as_ref(), &instruction, &prompt, language, previous)
                .await
            {
                Ok(mut acquired) => {
                    acquired.sources.clear();
                    self.store(&acquired, language).await;
                    record_outcome("secondary", language);
                    return acquired;
                }
                Err(e) => {
                    tracing::warn!(target: "pipeline", provider = secondary.name(), %prompt_id, error = %e, "secondary provider failed");
                }
            }
        }

        // 5) any cache entry, flagged as archive
        if let Some(entry) = cached {
            record_outcome("stale", language);
            let mut data = entry.data;
            data.status = FeedStatus::QuotaExceeded;
            if self.primary.is_none() {
                tracing::error!(target: "pipeline", "no primary provider key configured; prefixing archive with configuration notice");
                data.highlights.insert(0, configuration_highlight());
            }
            return Acquired {
                data,
                sources: entry.sources,
            };
        }

        // 6) terminal guarantee
        if self.primary.is_none() {
            tracing::error!(target: "pipeline", "no primary provider key configured; serving configuration notice");
        }
        record_outcome("static", language);
        Acquired {
            data: static_fallback(language, now, self.primary.is_none()),
            sources: Vec::new(),
        }
    }

    /// One provider call plus validation. Normalization failures count as
    /// provider failures for fallback purposes.
    async fn attempt(
        &self,
        provider: &dyn Provider,
        instruction: &str,
        prompt: &str,
        language: Language,
        previous: &[Highlight],
    ) -> PipelineResult<Acquired> {
        let outcome = call_and_parse(provider, instruction, prompt, language, previous).await;
        if outcome.is_err() {
            counter!("highlights_provider_failures_total", "provider" => provider.name())
                .increment(1);
        }
        outcome
    }

    async fn store(&self, acquired: &Acquired, language: Language) {
        let entry = CacheEntry::new(
            acquired.data.clone(),
            acquired.sources.clone(),
            Utc::now(),
            language,
        );
        self.cache.put(entry).await;
    }
}

async fn call_and_parse(
    provider: &dyn Provider,
    instruction: &str,
    prompt: &str,
    language: Language,
    previous: &[Highlight],
) -> PipelineResult<Acquired> {
    let output = provider.generate(instruction, prompt, language).await?;
    let parsed = normalize(&output.raw_text)
        .and_then(|resp| check_request(resp, &output.raw_text, language))
        .inspect_err(|e| {
            if let PipelineError::MalformedResponse { raw, .. } = e {
                tracing::debug!(target: "pipeline", provider = provider.name(), raw_id = %fingerprint(raw), "rejected payload: {raw}");
            }
        })?;
    audit_bangladesh(&parsed);
    Ok(Acquired {
        data: resolve(parsed, previous),
        sources: output.sources,
    })
}
