use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use url::Url;

use crate::error::{AppError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_db_path")]
    pub db_path: String,

    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Chat completions endpoint (OpenAI-compatible).
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    pub api_key: Option<String>,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_queue_batch_size")]
    pub queue_batch_size: usize,

    #[serde(default = "default_drain_max_batches")]
    pub drain_max_batches: usize,

    #[serde(default = "default_drain_failure_limit")]
    pub drain_failure_limit: usize,

    #[serde(default = "default_backfill_batch_size")]
    pub backfill_batch_size: usize,

    #[serde(default = "default_backfill_delay_ms")]
    pub backfill_delay_ms: u64,

    #[serde(default = "default_target_languages")]
    pub target_languages: Vec<String>,
}

fn default_db_path() -> String {
    let data_dir = dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("portal-translations");
    std::fs::create_dir_all(&data_dir).ok();
    data_dir.join("translations.db").to_string_lossy().to_string()
}

fn default_bind_address() -> String {
    "127.0.0.1:8787".to_string()
}

fn default_api_base_url() -> String {
    "https://api.openai.com/v1/chat/completions".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_temperature() -> f32 {
    0.3
}

fn default_max_tokens() -> u32 {
    1000
}

fn default_queue_batch_size() -> usize {
    10
}

fn default_drain_max_batches() -> usize {
    10
}

fn default_drain_failure_limit() -> usize {
    10
}

fn default_backfill_batch_size() -> usize {
    5
}

fn default_backfill_delay_ms() -> u64 {
    1000
}

fn default_target_languages() -> Vec<String> {
    crate::ai::BACKFILL_LANGUAGES
        .iter()
        .map(|code| code.to_string())
        .collect()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            bind_address: default_bind_address(),
            api_base_url: default_api_base_url(),
            api_key: None,
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            queue_batch_size: default_queue_batch_size(),
            drain_max_batches: default_drain_max_batches(),
            drain_failure_limit: default_drain_failure_limit(),
            backfill_batch_size: default_backfill_batch_size(),
            backfill_delay_ms: default_backfill_delay_ms(),
            target_languages: default_target_languages(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&Self::config_path())?;
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Reads the TOML file at `path`, writing a default one first if it is missing.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            let config = Config::default();
            config.save_to(path)?;
            Ok(config)
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| AppError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("portal-translations")
            .join("config.toml")
    }

    /// Environment variables win over the file.
    pub fn apply_env<F>(&mut self, var: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = var("TRANSLATION_DB_PATH") {
            self.db_path = path;
        }
        if let Some(addr) = var("TRANSLATION_BIND_ADDRESS") {
            self.bind_address = addr;
        }
        if let Some(url) = var("TRANSLATION_API_BASE_URL") {
            self.api_base_url = url;
        }
        if let Some(key) = var("TRANSLATION_API_KEY").or_else(|| var("OPENAI_API_KEY")) {
            self.api_key = Some(key);
        }
        if let Some(model) = var("TRANSLATION_MODEL") {
            self.model = model;
        }
    }

    pub fn validate(&self) -> Result<()> {
        let url = Url::parse(&self.api_base_url)
            .map_err(|e| AppError::Config(format!("invalid api_base_url: {}", e)))?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(AppError::Config(format!(
                "api_base_url must be http(s), got {}",
                url.scheme()
            )));
        }
        if self.queue_batch_size == 0 || self.backfill_batch_size == 0 {
            return Err(AppError::Config("batch sizes must be greater than zero".to_string()));
        }
        if self.drain_max_batches == 0 || self.drain_failure_limit == 0 {
            return Err(AppError::Config(
                "drain_max_batches and drain_failure_limit must be greater than zero".to_string(),
            ));
        }
        if self.target_languages.is_empty() {
            return Err(AppError::Config("target_languages must not be empty".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn missing_file_is_created_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let config = Config::load_from(&path).unwrap();

        assert!(path.exists());
        assert_eq!(config.backfill_batch_size, 5);
        assert_eq!(config.backfill_delay_ms, 1000);
        assert_eq!(config.target_languages, vec!["es", "ht", "he"]);
    }

    #[test]
    fn partial_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "model = \"gpt-4o\"\nqueue_batch_size = 25\n").unwrap();

        let config = Config::load_from(&path).unwrap();

        assert_eq!(config.model, "gpt-4o");
        assert_eq!(config.queue_batch_size, 25);
        assert_eq!(config.max_tokens, 1000);
        assert!(config.api_key.is_none());
    }

    #[test]
    fn env_overrides_file_values() {
        let env: HashMap<&str, &str> = [
            ("TRANSLATION_MODEL", "custom-model"),
            ("OPENAI_API_KEY", "sk-fallback"),
            ("TRANSLATION_BIND_ADDRESS", "0.0.0.0:9000"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_env(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.model, "custom-model");
        assert_eq!(config.api_key.as_deref(), Some("sk-fallback"));
        assert_eq!(config.bind_address, "0.0.0.0:9000");
    }

    #[test]
    fn rejects_bad_base_url_and_zero_batches() {
        let mut config = Config {
            api_base_url: "ftp://example.com".to_string(),
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(AppError::Config(_))));

        config.api_base_url = default_api_base_url();
        config.queue_batch_size = 0;
        assert!(matches!(config.validate(), Err(AppError::Config(_))));
    }

    #[test]
    fn rejects_zero_drain_limits() {
        let config = Config {
            drain_max_batches: 0,
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(AppError::Config(_))));

        let config = Config {
            drain_failure_limit: 0,
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(AppError::Config(_))));

        assert!(Config::default().validate().is_ok());
    }
}
