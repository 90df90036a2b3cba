use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use anyhow::{Result, anyhow};

use crate::locale::Locale;

pub const API_URL_VAR: &str = "RAG_API_URL";
pub const LANG_VAR: &str = "RAG_CHAT_LANG";

/// Contents of `<config_dir>/rag-chat/config.json`.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct Config {
    pub api_url: Option<String>,
    pub locale: Option<String>,
}

/// Where the backend URL came from, for the startup log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Env,
    ConfigFile,
}

/// Settings after env vars and the config file have been merged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub api_url: Option<String>,
    pub api_url_source: Option<Source>,
    pub locale: Locale,
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::get_config_path()?;
        Self::load_from(&config_path)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Self::default());
        }

        let config_content = fs::read_to_string(config_path)?;
        let config: Config = serde_json::from_str(&config_content)?;
        Ok(config)
    }

    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("rag-chat").join("config.json"))
    }
}

impl Settings {
    /// Resolves settings from the process environment and the config file.
    /// Call [`load_env_files`] first so `.env` values are visible.
    pub fn load() -> Self {
        let config = match Config::load() {
            Ok(config) => config,
            Err(e) => {
                log::warn!("ignoring unreadable config file: {:#}", e);
                Config::default()
            }
        };

        Self::resolve(
            std::env::var(API_URL_VAR).ok(),
            std::env::var(LANG_VAR).ok(),
            config,
        )
    }

    /// Environment values win over the config file; blank values count as unset.
    pub fn resolve(env_url: Option<String>, env_lang: Option<String>, config: Config) -> Self {
        let env_url = non_blank(env_url);
        let file_url = non_blank(config.api_url);

        let (api_url, api_url_source) = match (env_url, file_url) {
            (Some(url), _) => (Some(url), Some(Source::Env)),
            (None, Some(url)) => (Some(url), Some(Source::ConfigFile)),
            (None, None) => (None, None),
        };

        let locale = non_blank(env_lang)
            .and_then(|tag| Locale::from_tag(&tag))
            .or_else(|| config.locale.as_deref().and_then(Locale::from_tag))
            .unwrap_or_default();

        Self {
            api_url,
            api_url_source,
            locale,
        }
    }
}

/// Loads `.env.local` then `.env` from the working directory. Variables that
/// are already set are left alone, so `.env.local` wins over `.env`.
pub fn load_env_files() {
    dotenv::from_filename(".env.local").ok();
    dotenv::dotenv().ok();
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
