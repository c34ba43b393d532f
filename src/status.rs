//! Status resolution against the caller's previously accepted highlights,
//! plus the in-memory reference set that feeds `previousHighlights`.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::types::{FeedStatus, Highlight, Language, NewsResponse};

/// Reconcile a freshly normalized response with `previous`.
///
/// * `NO_NEW_UPDATE` keeps the caller's highlight bodies; only `generated_at`
///   and `status` come from the provider. With no previous set there is
///   nothing to trust, so the echoed highlights stay.
/// * `OK` and `QUOTA_EXCEEDED` pass through unchanged.
pub fn resolve(fresh: NewsResponse, previous: &[Highlight]) -> NewsResponse {
    match fresh.status {
        FeedStatus::NoNewUpdate if !previous.is_empty() => NewsResponse {
            highlights: previous.to_vec(),
            ..fresh
        },
        _ => fresh,
    }
}

/// Last accepted `OK` highlight set per language.
#[derive(Debug, Default)]
pub struct ReferenceSet {
    inner: RwLock<HashMap<Language, Vec<Highlight>>>,
}

impl ReferenceSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, language: Language) -> Vec<Highlight> {
        let g = match self.inner.read() {
            Ok(g) => g,
            Err(poison) => poison.into_inner(),
        };
        g.get(&language).cloned().unwrap_or_default()
    }

    /// Record `resp` if it is a genuine update. Returns whether the set changed.
    pub fn observe(&self, resp: &NewsResponse) -> bool {
        if resp.status != FeedStatus::Ok {
            return false;
        }
        let mut g = match self.inner.write() {
            Ok(g) => g,
            Err(poison) => poison.into_inner(),
        };
        g.insert(resp.language, resp.highlights.clone());
        true
    }
}
