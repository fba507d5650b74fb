use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use anyhow::{Result, anyhow};

use crate::welcome::WelcomeState;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_MODEL_LABEL: &str = "Gemini 2.5 Flash Lite";
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Environment variable that overrides `api_base_url`.
pub const URL_ENV: &str = "RAG_ON_TAP_URL";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    pub api_base_url: String,
    pub model_label: String,
    pub connect_timeout_secs: u64,
    pub welcome: WelcomeState,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn new() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            model_label: DEFAULT_MODEL_LABEL.to_string(),
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            welcome: WelcomeState::Unseen,
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }

        let config_content = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&config_content)?;
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Create config directory if it doesn't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let config_content = serde_json::to_string_pretty(self)?;
        fs::write(path, config_content)?;
        Ok(())
    }

    /// Persist only the welcome flag, leaving the rest of the file as the
    /// user wrote it. A file that does not parse is left untouched.
    pub fn save_welcome(path: &Path, welcome: WelcomeState) -> Result<()> {
        let mut config = Self::load_from(path)?;
        config.welcome = welcome;
        config.save_to(path)
    }

    pub fn apply_env(&mut self) {
        if let Ok(url) = std::env::var(URL_ENV) {
            if !url.trim().is_empty() {
                self.api_base_url = url;
            }
        }
    }

    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("rag-on-tap").join("config.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.json")).unwrap();
        assert_eq!(config, Config::new());
        assert!(config.welcome.is_open());
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "api_base_url": "http://brewery:9000" }"#).unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.api_base_url, "http://brewery:9000");
        assert_eq!(config.model_label, DEFAULT_MODEL_LABEL);
        assert_eq!(config.welcome, WelcomeState::Unseen);
    }

    #[test]
    fn invalid_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "not json").unwrap();
        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn welcome_flag_survives_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let mut config = Config::new();
        config.model_label = "House Model".to_string();
        config.save_to(&path).unwrap();

        Config::save_welcome(&path, WelcomeState::Unseen.dismiss()).unwrap();

        let reloaded = Config::load_from(&path).unwrap();
        assert_eq!(reloaded.welcome, WelcomeState::Seen);
        assert_eq!(reloaded.model_label, "House Model");
    }

    #[test]
    fn welcome_flag_never_clobbers_unparseable_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let original = r#"{ "api_base_url": "http://brewery:9000", }"#;
        fs::write(&path, original).unwrap();

        assert!(Config::save_welcome(&path, WelcomeState::Seen).is_err());
        assert_eq!(fs::read_to_string(&path).unwrap(), original);
    }

    #[test]
    fn welcome_flag_creates_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        Config::save_welcome(&path, WelcomeState::Seen).unwrap();

        let reloaded = Config::load_from(&path).unwrap();
        assert_eq!(reloaded.welcome, WelcomeState::Seen);
        assert_eq!(reloaded.api_base_url, DEFAULT_API_BASE_URL);
    }
}
