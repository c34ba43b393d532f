// tests/cache_file.rs
//
// File-backed cache: persistence across handles, corrupt record handling,
// and the on-disk layout.

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use highlight_feed::providers::MockProvider;
use highlight_feed::{
    CacheEntry, FeedStatus, FileCache, GroundingSource, HighlightCache, HighlightPipeline,
    Language, NewsResponse,
};

fn entry() -> CacheEntry {
    CacheEntry::new(
        NewsResponse {
            generated_at: "2025-03-01T10:00:00Z".into(),
            language: Language::Bn,
            status: FeedStatus::Ok,
            highlights: vec![],
        },
        vec![GroundingSource {
            uri: "https://news.example/a".into(),
            title: Some("A".into()),
        }],
        Utc.with_ymd_and_hms(2025, 3, 1, 10, 0, 0).unwrap(),
        Language::Bn,
    )
}

#[tokio::test]
async fn entry_survives_a_new_handle() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("highlights.json");

    FileCache::new(&path).put(entry()).await;
    let reopened = FileCache::new(&path);

    assert_eq!(reopened.get().await, Some(entry()));
    assert!(!path.with_extension("json.tmp").exists(), "temp file renamed away");
}

#[tokio::test]
async fn missing_file_is_a_miss() {
    let dir = tempfile::tempdir().unwrap();
    let cache = FileCache::new(dir.path().join("none.json"));
    assert!(cache.get().await.is_none());
}

#[tokio::test]
async fn corrupt_record_is_cleared_and_treated_as_absent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("highlights.json");
    std::fs::write(&path, r#"{"data": {"status": "OK"}, "timestamp": "yesterday"}"#).unwrap();

    let cache = FileCache::new(&path);
    assert!(cache.get().await.is_none());
    assert!(!path.exists(), "corrupt record should be removed");

    // slot is usable again afterwards
    cache.put(entry()).await;
    assert!(cache.get().await.is_some());
}

#[tokio::test]
async fn on_disk_layout_matches_storage_contract() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("highlights.json");
    FileCache::new(&path).put(entry()).await;

    let v: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    let mut keys: Vec<_> = v.as_object().unwrap().keys().cloned().collect();
    keys.sort();
    assert_eq!(keys, vec!["data", "lang", "sources", "timestamp"]);
    assert_eq!(v["lang"], "bn");
    assert_eq!(v["timestamp"], 1_740_823_200_000i64);
}

#[tokio::test]
async fn pipeline_over_corrupt_file_serves_static_fallback() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("highlights.json");
    std::fs::write(&path, "not json at all").unwrap();

    let pipeline = HighlightPipeline::new(Arc::new(FileCache::new(&path)))
        .with_primary(Arc::new(MockProvider::failing()));
    let out = pipeline.acquire(Language::En, &[]).await;

    assert_eq!(out.data.status, FeedStatus::QuotaExceeded);
    assert!(out.sources.is_empty());
    assert!(!path.exists());
}
