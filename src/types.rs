//! types.rs — Shared data model for highlights, responses and grounding sources.
//!
//! JSON shapes here are what providers are instructed to emit and what the
//! client consumes, so serde names are part of the contract.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Output language of a highlight set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Bn,
}

impl Language {
    pub fn code(self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Bn => "bn",
        }
    }

    /// Human name used inside provider prompts.
    pub fn display_name(self) -> &'static str {
        match self {
            Language::En => "English",
            Language::Bn => "Bengali (Bangla)",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" => Ok(Language::En),
            "bn" => Ok(Language::Bn),
            other => Err(format!("unsupported language: {other}")),
        }
    }
}

/// Acquisition status carried by every response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FeedStatus {
    Ok,
    NoNewUpdate,
    /// Degraded: the payload may be archival rather than freshly acquired.
    QuotaExceeded,
}

impl FeedStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            FeedStatus::Ok => "OK",
            FeedStatus::NoNewUpdate => "NO_NEW_UPDATE",
            FeedStatus::QuotaExceeded => "QUOTA_EXCEEDED",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    World,
    Economy,
    Tech,
    Security,
    Climate,
    Politics,
    Bangladesh,
    #[serde(other)]
    Other,
}

/// One synthesized news item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Highlight {
    pub headline: String,
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub category: Category,
    /// Short display string (e.g. "2h ago", "09:30 BST").
    pub timestamp: String,
}

/// A complete highlight set as produced by a provider or served from cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsResponse {
    pub generated_at: String,
    pub language: Language,
    pub status: FeedStatus,
    pub highlights: Vec<Highlight>,
}

impl NewsResponse {
    /// True for archival or static payloads served after provider failure.
    pub fn is_degraded(&self) -> bool {
        self.status == FeedStatus::QuotaExceeded
    }
}

/// Web citation attributed to a grounded provider answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroundingSource {
    pub uri: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// What `acquire` hands back to its caller: the payload plus attribution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Acquired {
    pub data: NewsResponse,
    pub sources: Vec<GroundingSource>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_and_language_use_wire_names() {
        let s = serde_json::to_string(&FeedStatus::NoNewUpdate).unwrap();
        assert_eq!(s, "\"NO_NEW_UPDATE\"");
        let l: Language = serde_json::from_str("\"bn\"").unwrap();
        assert_eq!(l, Language::Bn);
    }

    #[test]
    fn unknown_category_maps_to_other() {
        let h: Highlight = serde_json::from_str(
            r#"{"headline":"h","summary":"s","category":"sports","timestamp":"1h ago"}"#,
        )
        .unwrap();
        assert_eq!(h.category, Category::Other);
        assert!(h.url.is_none());
    }

    #[test]
    fn language_parses_case_insensitively() {
        assert_eq!("EN".parse::<Language>().unwrap(), Language::En);
        assert!("fr".parse::<Language>().is_err());
    }
}
