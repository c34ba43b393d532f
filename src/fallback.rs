//! Fixed archival payload served when no provider and no cache can answer.

use chrono::{DateTime, SecondsFormat, Utc};

use crate::types::{Category, FeedStatus, Highlight, Language, NewsResponse};

pub const MAINTENANCE_HEADLINE: &str = "System Maintenance: Live Feed Paused";
pub const CONFIGURATION_HEADLINE: &str = "Configuration Required";

fn archive_item(headline: &str, summary: &str, category: Category) -> Highlight {
    Highlight {
        headline: headline.to_string(),
        summary: summary.to_string(),
        url: None,
        category,
        timestamp: "Archive".to_string(),
    }
}

/// The archival highlight set. Always starts with the maintenance notice.
pub fn static_highlights() -> Vec<Highlight> {
    vec![
        archive_item(
            MAINTENANCE_HEADLINE,
            "Live highlights are temporarily unavailable because the news providers \
could not be reached. The feed refreshes automatically once service resumes.",
            Category::Other,
        ),
        archive_item(
            "Bangladesh Coverage Will Resume Shortly",
            "Regional coverage is paused along with the live feed and will return on \
the next successful refresh.",
            Category::Bangladesh,
        ),
        archive_item(
            "World Headlines Unavailable",
            "International updates will appear here as soon as a provider responds.",
            Category::World,
        ),
    ]
}

pub fn configuration_highlight() -> Highlight {
    Highlight {
        headline: CONFIGURATION_HEADLINE.to_string(),
        summary: "No API key is configured for the primary news provider. Set \
GEMINI_API_KEY (or the primary api_key in the highlights config) and restart \
the service."
            .to_string(),
        url: None,
        category: Category::Other,
        timestamp: "Now".to_string(),
    }
}

/// Terminal payload: status `QUOTA_EXCEEDED`, archival highlights.
/// With `needs_configuration` the maintenance notice is swapped for the
/// configuration notice.
pub fn static_fallback(
    language: Language,
    now: DateTime<Utc>,
    needs_configuration: bool,
) -> NewsResponse {
    let mut highlights = static_highlights();
    if needs_configuration {
        highlights[0] = configuration_highlight();
    }
    NewsResponse {
        generated_at: now.to_rfc3339_opts(SecondsFormat::Secs, true),
        language,
        status: FeedStatus::QuotaExceeded,
        highlights,
    }
}
