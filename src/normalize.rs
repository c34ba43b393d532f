// src/normalize.rs
//! Turns raw provider text into a [`NewsResponse`], or fails with the raw text attached.

use metrics::counter;
use once_cell::sync::OnceCell;
use regex::Regex;

use crate::errors::{PipelineError, PipelineResult};
use crate::types::{Category, FeedStatus, Language, NewsResponse};

/// Remove code-fence wrapping and any chatter around the JSON object.
pub fn strip_formatting(raw: &str) -> &str {
    static RE_FENCE: OnceCell<Regex> = OnceCell::new();
    let re = RE_FENCE.get_or_init(|| {
        Regex::new(r"(?s)^\s*```[A-Za-z]*\s*(.*?)\s*```\s*$").expect("fence regex")
    });

    let inner = match re.captures(raw).and_then(|c| c.get(1)) {
        Some(m) => m.as_str(),
        None => raw.trim(),
    };

    if inner.starts_with('{') {
        return inner;
    }
    // e.g. "Here are today's highlights: {...}"
    match (inner.find('{'), inner.rfind('}')) {
        (Some(start), Some(end)) if start < end => &inner[start..=end],
        _ => inner,
    }
}

/// Parse provider output. Never partially accepts a payload.
pub fn normalize(raw: &str) -> PipelineResult<NewsResponse> {
    let body = strip_formatting(raw);
    serde_json::from_str::<NewsResponse>(body).map_err(|e| {
        counter!("highlights_malformed_total").increment(1);
        PipelineError::MalformedResponse {
            reason: e.to_string(),
            raw: raw.to_string(),
        }
    })
}

/// Reject parsed payloads that cannot stand in for the request: a language
/// other than the one asked for, or a `QUOTA_EXCEEDED` status, which only the
/// pipeline itself may assign.
pub fn check_request(
    resp: NewsResponse,
    raw: &str,
    language: Language,
) -> PipelineResult<NewsResponse> {
    let reason = if resp.language != language {
        format!("language {} does not match requested {language}", resp.language)
    } else if resp.status == FeedStatus::QuotaExceeded {
        "provider reported QUOTA_EXCEEDED".to_string()
    } else {
        return Ok(resp);
    };
    counter!("highlights_malformed_total").increment(1);
    Err(PipelineError::MalformedResponse {
        reason,
        raw: raw.to_string(),
    })
}

/// Count `bangladesh` highlights on an OK response. Logged, not enforced.
pub fn audit_bangladesh(resp: &NewsResponse) -> usize {
    let n = resp
        .highlights
        .iter()
        .filter(|h| h.category == Category::Bangladesh)
        .count();
    if resp.status == FeedStatus::Ok && n != 1 {
        tracing::warn!(
            target: "pipeline",
            count = n,
            language = %resp.language,
            "provider response breaks the one-bangladesh-highlight rule"
        );
        counter!("highlights_bangladesh_mismatch_total").increment(1);
    }
    n
}
