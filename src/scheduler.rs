// src/scheduler.rs
//! Periodic refresh: the only retry mechanism. Each tick re-invokes `acquire`
//! for every configured language with that language's reference set.

use std::sync::Arc;
use std::time::Duration;

use metrics::{counter, gauge};
use tokio::task::JoinHandle;

use crate::pipeline::HighlightPipeline;
use crate::status::ReferenceSet;
use crate::types::Language;

#[derive(Clone, Debug)]
pub struct RefreshSchedulerCfg {
    pub interval: Duration,
    pub languages: Vec<Language>,
}

/// Run one refresh pass over `languages`. Returns how many passes produced a
/// non-degraded response.
pub async fn refresh_once(
    pipeline: &HighlightPipeline,
    reference: &ReferenceSet,
    languages: &[Language],
) -> usize {
    let mut healthy = 0usize;
    for &language in languages {
        let previous = reference.get(language);
        let acquired = pipeline.acquire(language, &previous).await;
        let changed = reference.observe(&acquired.data);
        if !acquired.data.is_degraded() {
            healthy += 1;
        }
        tracing::info!(
            target: "scheduler",
            %language,
            status = acquired.data.status.as_str(),
            highlights = acquired.data.highlights.len(),
            sources = acquired.sources.len(),
            changed,
            "refresh tick"
        );
    }
    counter!("highlights_refresh_runs_total").increment(1);
    gauge!("highlights_refresh_last_run_ts").set(chrono::Utc::now().timestamp() as f64);
    healthy
}

/// Spawn the background refresh loop. The first tick fires immediately.
pub fn spawn_refresh_scheduler(
    pipeline: Arc<HighlightPipeline>,
    reference: Arc<ReferenceSet>,
    cfg: RefreshSchedulerCfg,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(cfg.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            refresh_once(&pipeline, &reference, &cfg.languages).await;
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCache;
    use crate::providers::MockProvider;

    const OK_BODY: &str = r#"{"generated_at":"2025-03-01T10:00:00Z","language":"en","status":"OK",
        "highlights":[{"headline":"A","summary":"s","category":"bangladesh","timestamp":"1h ago"}]}"#;

    #[tokio::test]
    async fn refresh_once_updates_reference_set() {
        let pipeline = HighlightPipeline::new(Arc::new(MemoryCache::new()))
            .with_primary(Arc::new(MockProvider::replying(OK_BODY, vec![])));
        let refs = ReferenceSet::new();

        let healthy = refresh_once(&pipeline, &refs, &[Language::En]).await;
        assert_eq!(healthy, 1);
        assert_eq!(refs.get(Language::En)[0].headline, "A");
    }

    #[tokio::test]
    async fn degraded_pass_leaves_reference_untouched() {
        let pipeline = HighlightPipeline::new(Arc::new(MemoryCache::new()));
        let refs = ReferenceSet::new();

        let healthy = refresh_once(&pipeline, &refs, &[Language::En, Language::Bn]).await;
        assert_eq!(healthy, 0);
        assert!(refs.get(Language::En).is_empty());
    }
}
