//! Persistent single-slot cache for the last successful highlight acquisition.
//!
//! One record under a fixed key. Freshness is judged by the caller via
//! [`CacheEntry::is_fresh_for`]; the store only loads and saves.

use std::io;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use metrics::counter;
use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::errors::{PipelineError, PipelineResult};
use crate::types::{GroundingSource, Language, NewsResponse};

/// Fixed identifier of the cache slot (also the file stem on disk).
pub const CACHE_KEY: &str = "news_highlights_cache";
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(15 * 60);

pub fn default_cache_path() -> PathBuf {
    PathBuf::from("cache").join(format!("{CACHE_KEY}.json"))
}

/// Stored layout: `{data, sources, timestamp: epoch-millis, lang}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub data: NewsResponse,
    #[serde(default)]
    pub sources: Vec<GroundingSource>,
    #[serde(rename = "timestamp", with = "chrono::serde::ts_milliseconds")]
    pub captured_at: DateTime<Utc>,
    #[serde(rename = "lang")]
    pub language: Language,
}

impl CacheEntry {
    pub fn new(
        data: NewsResponse,
        sources: Vec<GroundingSource>,
        captured_at: DateTime<Utc>,
        language: Language,
    ) -> Self {
        Self {
            data,
            sources,
            captured_at,
            language,
        }
    }

    /// Fresh iff younger than `ttl` and generated for `language`.
    pub fn is_fresh_for(&self, language: Language, now: DateTime<Utc>, ttl: Duration) -> bool {
        if self.language != language {
            return false;
        }
        match now.signed_duration_since(self.captured_at).to_std() {
            Ok(age) => age < ttl,
            // captured "in the future" (clock moved backwards)
            Err(_) => true,
        }
    }
}

/// Storage handle injected into the pipeline.
#[async_trait]
pub trait HighlightCache: Send + Sync {
    /// Returns the stored entry, or `None` when absent or unreadable.
    async fn get(&self) -> Option<CacheEntry>;
    /// Overwrites the slot. Write failures are logged, never returned.
    async fn put(&self, entry: CacheEntry);
}

// ------------------------------------------------------------
// File-backed cache (durable across restarts)
// ------------------------------------------------------------

pub struct FileCache {
    path: PathBuf,
}

impl FileCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    async fn load(&self) -> PipelineResult<Option<CacheEntry>> {
        let raw = match fs::read_to_string(&self.path).await {
            Ok(s) => s,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                tracing::warn!(target: "cache", path = %self.path.display(), "cache read failed: {e}");
                return Ok(None);
            }
        };
        serde_json::from_str::<CacheEntry>(&raw)
            .map(Some)
            .map_err(|e| PipelineError::CacheCorrupt(e.to_string()))
    }

    async fn store(&self, entry: &CacheEntry) -> io::Result<()> {
        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() {
                fs::create_dir_all(dir).await?;
            }
        }
        let json = serde_json::to_vec(entry).map_err(io::Error::other)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).await?;
        fs::rename(&tmp, &self.path).await
    }
}

#[async_trait]
impl HighlightCache for FileCache {
    async fn get(&self) -> Option<CacheEntry> {
        match self.load().await {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(target: "cache", path = %self.path.display(), error = %e, "discarding corrupt cache record");
                counter!("highlights_cache_corrupt_total").increment(1);
                if let Err(rm) = fs::remove_file(&self.path).await {
                    tracing::warn!(target: "cache", "failed to remove corrupt record: {rm}");
                }
                None
            }
        }
    }

    async fn put(&self, entry: CacheEntry) {
        if let Err(e) = self.store(&entry).await {
            tracing::warn!(target: "cache", path = %self.path.display(), "cache write failed: {e}");
        }
    }
}

// ------------------------------------------------------------
// In-memory cache (tests, ephemeral deployments)
// ------------------------------------------------------------

#[derive(Default)]
pub struct MemoryCache {
    slot: Mutex<Option<CacheEntry>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(entry: CacheEntry) -> Self {
        Self {
            slot: Mutex::new(Some(entry)),
        }
    }

    /// Synchronous peek for assertions.
    pub fn snapshot(&self) -> Option<CacheEntry> {
        match self.slot.lock() {
            Ok(g) => g.clone(),
            Err(poison) => poison.into_inner().clone(),
        }
    }
}

#[async_trait]
impl HighlightCache for MemoryCache {
    async fn get(&self) -> Option<CacheEntry> {
        self.snapshot()
    }

    async fn put(&self, entry: CacheEntry) {
        let mut g = match self.slot.lock() {
            Ok(g) => g,
            Err(poison) => poison.into_inner(),
        };
        *g = Some(entry);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FeedStatus;
    use chrono::TimeZone;

    fn entry(lang: Language, at: DateTime<Utc>) -> CacheEntry {
        CacheEntry::new(
            NewsResponse {
                generated_at: "2025-03-01T10:00:00Z".into(),
                language: lang,
                status: FeedStatus::Ok,
                highlights: vec![],
            },
            vec![GroundingSource {
                uri: "https://example.org/a".into(),
                title: None,
            }],
            at,
            lang,
        )
    }

    #[test]
    fn freshness_needs_age_and_language() {
        let t0 = Utc.with_ymd_and_hms(2025, 3, 1, 10, 0, 0).unwrap();
        let e = entry(Language::En, t0);
        let ttl = DEFAULT_CACHE_TTL;

        assert!(e.is_fresh_for(Language::En, t0 + chrono::Duration::minutes(14), ttl));
        assert!(!e.is_fresh_for(Language::En, t0 + chrono::Duration::minutes(15), ttl));
        assert!(!e.is_fresh_for(Language::Bn, t0 + chrono::Duration::minutes(1), ttl));
    }

    #[test]
    fn stored_layout_uses_timestamp_millis_and_lang() {
        let t0 = Utc.with_ymd_and_hms(2025, 3, 1, 10, 0, 0).unwrap();
        let v = serde_json::to_value(entry(Language::Bn, t0)).unwrap();
        assert_eq!(v["timestamp"], serde_json::json!(t0.timestamp_millis()));
        assert_eq!(v["lang"], "bn");
        assert_eq!(v["data"]["status"], "OK");
        assert_eq!(v["sources"][0]["uri"], "https://example.org/a");
    }

    #[tokio::test]
    async fn memory_cache_overwrites_single_slot() {
        let c = MemoryCache::new();
        assert!(c.get().await.is_none());
        let t0 = Utc.with_ymd_and_hms(2025, 3, 1, 10, 0, 0).unwrap();
        c.put(entry(Language::En, t0)).await;
        c.put(entry(Language::Bn, t0)).await;
        assert_eq!(c.get().await.map(|e| e.language), Some(Language::Bn));
    }
}
