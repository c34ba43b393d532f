// src/config/mod.rs
//! Service configuration: TOML or JSON file, env-resolved provider keys.

pub mod providers;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cache::{default_cache_path, DEFAULT_CACHE_TTL};
use crate::types::Language;

pub use providers::{ProviderSettings, PRIMARY_KEY_ENV, SECONDARY_KEY_ENV};

pub const ENV_CONFIG_PATH: &str = "HIGHLIGHTS_CONFIG_PATH";
pub const DEFAULT_TOML_PATH: &str = "config/highlights.toml";
pub const DEFAULT_JSON_PATH: &str = "config/highlights.json";

const DEFAULT_REFRESH_SECS: u64 = 30 * 60;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Search-grounded provider (Gemini).
    pub primary: ProviderSettings,
    /// Text-only fallback provider (OpenAI).
    pub secondary: ProviderSettings,
    pub cache_ttl_secs: u64,
    pub cache_path: PathBuf,
    /// Scheduler period; 0 disables background refresh.
    pub refresh_interval_secs: u64,
    pub languages: Vec<Language>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            primary: ProviderSettings::default(),
            secondary: ProviderSettings::default(),
            cache_ttl_secs: DEFAULT_CACHE_TTL.as_secs(),
            cache_path: default_cache_path(),
            refresh_interval_secs: DEFAULT_REFRESH_SECS,
            languages: vec![Language::En],
        }
    }
}

impl PipelineConfig {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn refresh_interval(&self) -> Option<Duration> {
        (self.refresh_interval_secs > 0).then(|| Duration::from_secs(self.refresh_interval_secs))
    }

    /// Defaults with keys taken from the environment.
    pub fn from_env() -> Self {
        Self::default().finalize()
    }

    /// Load from an explicit path. Format is chosen by extension (toml/json).
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)
            .with_context(|| format!("reading highlights config from {}", path.display()))?;
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        let cfg: PipelineConfig = match ext.as_str() {
            "toml" => toml::from_str(&data).context("parsing TOML config")?,
            "json" => serde_json::from_str(&data).context("parsing JSON config")?,
            other => return Err(anyhow!("unsupported config format: {other:?}")),
        };
        Ok(cfg.finalize())
    }

    /// Load using env var + fallbacks:
    /// 1) $HIGHLIGHTS_CONFIG_PATH
    /// 2) config/highlights.toml
    /// 3) config/highlights.json
    /// 4) built-in defaults
    pub fn load_default() -> Result<Self> {
        if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
            }
            return Self::load_from_file(&pb);
        }
        for candidate in [DEFAULT_TOML_PATH, DEFAULT_JSON_PATH] {
            let p = Path::new(candidate);
            if p.exists() {
                return Self::load_from_file(p);
            }
        }
        Ok(Self::from_env())
    }

    fn finalize(mut self) -> Self {
        self.primary.resolve_key(PRIMARY_KEY_ENV);
        self.secondary.resolve_key(SECONDARY_KEY_ENV);
        if self.cache_ttl_secs == 0 {
            self.cache_ttl_secs = DEFAULT_CACHE_TTL.as_secs();
        }
        let mut seen = HashSet::new();
        self.languages.retain(|l| seen.insert(*l));
        if self.languages.is_empty() {
            self.languages.push(Language::En);
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{env, fs};

    #[serial_test::serial]
    #[test]
    fn toml_and_json_parse_with_defaults() {
        env::remove_var(PRIMARY_KEY_ENV);
        env::remove_var(SECONDARY_KEY_ENV);
        let tmp = tempfile::tempdir().unwrap();

        let toml_p = tmp.path().join("h.toml");
        fs::write(
            &toml_p,
            r#"
cache_ttl_secs = 600
languages = ["en", "bn"]

[primary]
api_key = "g-key"
model = "gemini-test"
"#,
        )
        .unwrap();
        let cfg = PipelineConfig::load_from_file(&toml_p).unwrap();
        assert_eq!(cfg.cache_ttl(), Duration::from_secs(600));
        assert_eq!(cfg.languages, vec![Language::En, Language::Bn]);
        assert!(cfg.primary.has_credentials());
        assert_eq!(cfg.primary.model.as_deref(), Some("gemini-test"));
        assert!(!cfg.secondary.has_credentials());

        let json_p = tmp.path().join("h.json");
        fs::write(&json_p, r#"{"cache_ttl_secs": 0, "refresh_interval_secs": 0}"#).unwrap();
        let cfg = PipelineConfig::load_from_file(&json_p).unwrap();
        assert_eq!(cfg.cache_ttl(), DEFAULT_CACHE_TTL);
        assert!(cfg.refresh_interval().is_none());
        assert_eq!(cfg.languages, vec![Language::En]);
    }

    #[serial_test::serial]
    #[test]
    fn repeated_languages_are_collapsed_in_order() {
        let tmp = tempfile::tempdir().unwrap();
        let p = tmp.path().join("h.json");
        fs::write(&p, r#"{"languages": ["en", "bn", "en", "bn"]}"#).unwrap();
        let cfg = PipelineConfig::load_from_file(&p).unwrap();
        assert_eq!(cfg.languages, vec![Language::En, Language::Bn]);
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let p = tmp.path().join("h.yaml");
        fs::write(&p, "x: 1").unwrap();
        assert!(PipelineConfig::load_from_file(&p).is_err());
    }

    #[serial_test::serial]
    #[test]
    fn default_uses_env_path_then_fallbacks() {
        let old = env::current_dir().unwrap();
        let tmp = tempfile::tempdir().unwrap();
        env::set_current_dir(tmp.path()).unwrap();
        env::remove_var(ENV_CONFIG_PATH);
        env::set_var(SECONDARY_KEY_ENV, "o-key");

        // no files: defaults, keys from env
        let cfg = PipelineConfig::load_default().unwrap();
        assert!(cfg.secondary.has_credentials());
        assert_eq!(cfg.cache_ttl(), DEFAULT_CACHE_TTL);

        // env path wins
        let p = tmp.path().join("custom.json");
        fs::write(&p, r#"{"refresh_interval_secs": 120}"#).unwrap();
        env::set_var(ENV_CONFIG_PATH, p.display().to_string());
        let cfg = PipelineConfig::load_default().unwrap();
        assert_eq!(cfg.refresh_interval(), Some(Duration::from_secs(120)));

        env::set_var(ENV_CONFIG_PATH, tmp.path().join("missing.toml").display().to_string());
        assert!(PipelineConfig::load_default().is_err());

        env::remove_var(ENV_CONFIG_PATH);
        env::remove_var(SECONDARY_KEY_ENV);
        env::set_current_dir(&old).unwrap();
    }
}
