// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod api;
pub mod cache;
pub mod config;
pub mod errors;
pub mod fallback;
pub mod metrics;
pub mod normalize;
pub mod pipeline;
pub mod prompt;
pub mod providers;
pub mod scheduler;
pub mod status;
pub mod types;

use std::sync::Arc;

// ---- Re-exports for stable public API ----
pub use crate::api::{router, AppState};
pub use crate::cache::{CacheEntry, FileCache, HighlightCache, MemoryCache};
pub use crate::config::PipelineConfig;
pub use crate::pipeline::HighlightPipeline;
pub use crate::types::{
    Acquired, Category, FeedStatus, GroundingSource, Highlight, Language, NewsResponse,
};

/// Wire a file-backed pipeline from configuration.
pub fn build_state(cfg: &PipelineConfig) -> AppState {
    let cache = Arc::new(FileCache::new(cfg.cache_path.clone()));
    AppState::new(HighlightPipeline::from_config(cfg, cache))
}
