// src/config/providers.rs
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

pub const PRIMARY_KEY_ENV: &str = "GEMINI_API_KEY";
pub const SECONDARY_KEY_ENV: &str = "OPENAI_API_KEY";

fn default_api_key() -> String {
    "ENV".to_string()
}
fn default_timeout_secs() -> u64 {
    30
}

/// Credentials and tuning for one provider adapter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderSettings {
    /// "ENV" means: read from the provider's env var (unset => not configured)
    #[serde(default = "default_api_key")]
    pub api_key: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            api_key: default_api_key(),
            model: None,
            base_url: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl ProviderSettings {
    /// Resolve an "ENV" key placeholder. A missing variable leaves the key empty.
    pub fn resolve_key(&mut self, var: &str) {
        if self.api_key.trim().eq_ignore_ascii_case("env") {
            self.api_key = env::var(var).unwrap_or_default().trim().to_string();
        }
        if self.timeout_secs == 0 {
            self.timeout_secs = default_timeout_secs();
        }
    }

    pub fn has_credentials(&self) -> bool {
        let k = self.api_key.trim();
        !k.is_empty() && !k.eq_ignore_ascii_case("env")
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[serial_test::serial]
    #[test]
    fn env_placeholder_resolves_or_stays_unconfigured() {
        let var = "HIGHLIGHTS_TEST_PROVIDER_KEY";

        env::remove_var(var);
        let mut s = ProviderSettings::default();
        s.resolve_key(var);
        assert!(!s.has_credentials());

        env::set_var(var, "  k-123 ");
        let mut s = ProviderSettings::default();
        s.resolve_key(var);
        assert_eq!(s.api_key, "k-123");
        assert!(s.has_credentials());
        env::remove_var(var);
    }

    #[test]
    fn literal_key_is_kept() {
        let mut s = ProviderSettings {
            api_key: "literal".into(),
            timeout_secs: 0,
            ..Default::default()
        };
        s.resolve_key("UNUSED_VAR_FOR_TEST");
        assert_eq!(s.api_key, "literal");
        assert_eq!(s.timeout_secs, 30);
    }
}
