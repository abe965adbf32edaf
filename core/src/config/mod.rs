use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const WANDERPLAN_DIR: &str = ".wanderplan";

pub const DEFAULT_PERPLEXITY_BASE_URL: &str = "https://api.perplexity.ai";
pub const DEFAULT_SEARCH_MODEL: &str = "sonar";
pub const DEFAULT_AZURE_API_VERSION: &str = "2024-05-01-preview";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct SamplingConfig {
    pub temperature: f64,
    pub top_p: f64,
    pub max_tokens: u32,
}

impl SamplingConfig {
    pub const fn planner() -> Self {
        Self {
            temperature: 0.6,
            top_p: 0.9,
            max_tokens: 1200,
        }
    }

    pub const fn chat() -> Self {
        Self {
            temperature: 0.7,
            top_p: 0.95,
            max_tokens: 13107,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub perplexity_api_key: Option<String>,
    pub perplexity_base_url: String,
    pub search_model: String,
    pub search_timeout_secs: u64,
    pub azure_endpoint: Option<String>,
    pub azure_deployment: Option<String>,
    pub azure_api_key: Option<String>,
    pub azure_ad_token: Option<String>,
    pub azure_api_version: String,
    pub cognitive_services_resource: Option<String>,
    pub azure_search_endpoint: Option<String>,
    pub azure_search_index: Option<String>,
    pub host: String,
    pub port: u16,
    pub planner: SamplingConfig,
    pub chat: SamplingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            perplexity_api_key: None,
            perplexity_base_url: DEFAULT_PERPLEXITY_BASE_URL.to_string(),
            search_model: DEFAULT_SEARCH_MODEL.to_string(),
            search_timeout_secs: 60,
            azure_endpoint: None,
            azure_deployment: None,
            azure_api_key: None,
            azure_ad_token: None,
            azure_api_version: DEFAULT_AZURE_API_VERSION.to_string(),
            cognitive_services_resource: None,
            azure_search_endpoint: None,
            azure_search_index: None,
            host: "0.0.0.0".to_string(),
            port: 8000,
            planner: SamplingConfig::planner(),
            chat: SamplingConfig::chat(),
        }
    }
}

pub fn get_wanderplan_dir() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(WANDERPLAN_DIR)
}

pub fn get_config_path() -> PathBuf {
    get_wanderplan_dir().join("config.toml")
}

pub fn config_exists() -> bool {
    get_config_path().exists()
}

impl Config {
    /// Defaults, then `~/.wanderplan/config.toml` if present, then the process environment.
    pub fn load() -> Result<Self> {
        let base = if config_exists() {
            load_config_from(&get_config_path())?
        } else {
            Config::default()
        };
        Ok(base.with_env(|key| std::env::var(key).ok()))
    }

    pub fn with_env<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let overrides: [(&str, &mut Option<String>); 8] = [
            ("PERPLEXITY_API_KEY", &mut self.perplexity_api_key),
            ("ENDPOINT_URL", &mut self.azure_endpoint),
            ("DEPLOYMENT_NAME", &mut self.azure_deployment),
            ("AZURE_OPENAI_API_KEY", &mut self.azure_api_key),
            ("AZURE_OPENAI_AD_TOKEN", &mut self.azure_ad_token),
            (
                "AZURE_COGNITIVE_SERVICES_RESOURCE",
                &mut self.cognitive_services_resource,
            ),
            ("AZURE_AI_SEARCH_ENDPOINT", &mut self.azure_search_endpoint),
            ("AZURE_AI_SEARCH_INDEX", &mut self.azure_search_index),
        ];
        for (key, slot) in overrides {
            if let Some(value) = get(key) {
                *slot = Some(value);
            }
        }

        if let Some(host) = get("WANDERPLAN_HOST") {
            self.host = host;
        }
        if let Some(port) = get("WANDERPLAN_PORT").and_then(|p| p.trim().parse().ok()) {
            self.port = port;
        }

        self
    }
}

pub fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

pub fn load_config_from(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::Configuration(format!(
            "Failed to read config from {}: {}",
            path.display(),
            e
        ))
    })?;

    toml::from_str(&content).map_err(|e| {
        Error::Configuration(format!(
            "Failed to parse config from {}: {}",
            path.display(),
            e
        ))
    })
}

pub fn save_config(config: &Config) -> Result<()> {
    save_config_to(config, &get_config_path())
}

pub fn save_config_to(config: &Config, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let content = toml::to_string_pretty(config)
        .map_err(|e| Error::Configuration(format!("Failed to serialize config to TOML: {e}")))?;

    std::fs::write(path, content)?;
    Ok(())
}
