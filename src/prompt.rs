//! Provider instructions and the per-request prompt.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use crate::types::{Category, Highlight, Language};

/// Headline + category only; summaries are left out to keep prompts small.
#[derive(Debug, Serialize)]
struct PreviousItem<'a> {
    headline: &'a str,
    category: Category,
}

pub fn system_instruction(language: Language) -> String {
    format!(
        "You are a news desk editor. Using live web search, produce the most important \
current news highlights. Write every headline and summary in {lang}.\n\
Return ONLY a JSON object, no markdown, with this shape:\n\
{{\"generated_at\": RFC3339 string, \"language\": \"{code}\", \
\"status\": \"OK\" | \"NO_NEW_UPDATE\", \"highlights\": [{{\"headline\": string, \
\"summary\": string (2-3 sentences), \"url\": string or omitted, \"category\": one of \
world|economy|tech|security|climate|politics|bangladesh|other, \"timestamp\": short \
display time such as \"2h ago\"}}]}}\n\
Rules:\n\
- Return 6 to 10 highlights.\n\
- Include exactly one highlight with category \"bangladesh\".\n\
- If nothing material changed compared to the previous highlights, set status to \
\"NO_NEW_UPDATE\" and repeat the previous highlights.",
        lang = language.display_name(),
        code = language.code(),
    )
}

pub fn build_prompt(now: DateTime<Utc>, language: Language, previous: &[Highlight]) -> String {
    let items: Vec<PreviousItem<'_>> = previous
        .iter()
        .map(|h| PreviousItem {
            headline: &h.headline,
            category: h.category,
        })
        .collect();
    let previous_json = serde_json::to_string(&items).unwrap_or_else(|_| "[]".to_string());

    format!(
        "Current time: {}\nTarget language: {} ({})\nPrevious highlights: {}",
        now.to_rfc3339_opts(SecondsFormat::Secs, true),
        language.display_name(),
        language.code(),
        previous_json
    )
}

/// Short, stable id for logging a prompt without its contents.
pub fn fingerprint(text: &str) -> String {
    use sha2::{Digest, Sha256};
    let digest = Sha256::digest(text.as_bytes());
    let mut out = String::with_capacity(12);
    for b in digest.iter().take(6) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{b:02x}");
    }
    out
}
