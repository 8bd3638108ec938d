use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_BASE_URL: &str = "http://localhost:9200";
pub const DEFAULT_INDEX: &str = "ansible-logs";

const HOST_ENV: &str = "ANSIBLE_ELASTICSEARCH_HOST";
const INDEX_ENV: &str = "ANSIBLE_ELASTICSEARCH_INDEX";
const LOG_RESULTS_ENV: &str = "ANSIBLE_ELASTICSEARCH_LOG_RESULTS";
const CONFIG_PATH_ENV: &str = "ELK_RELAY_CONFIG";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    pub base_url: String,
    pub index_name: String,
    pub log_task_results: bool,
    pub config_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            index_name: DEFAULT_INDEX.to_string(),
            log_task_results: true,
            config_path: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Layers defaults, the optional JSON file, then the looked-up variables.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(path) = lookup(CONFIG_PATH_ENV).filter(|p| !p.trim().is_empty()) {
            let path = PathBuf::from(path);
            let file_config = Self::from_conf_file(&path)?;
            config.apply_file(file_config);
            config.config_path = Some(path);
        }

        if let Some(host) = lookup(HOST_ENV) {
            config.base_url = host;
        }

        if let Some(index) = lookup(INDEX_ENV) {
            config.index_name = index;
        }

        if let Some(raw) = lookup(LOG_RESULTS_ENV) {
            match parse_bool(&raw) {
                Some(value) => config.log_task_results = value,
                None => tracing::warn!(
                    "Ignoring invalid {} value '{}', keeping {}",
                    LOG_RESULTS_ENV,
                    raw,
                    config.log_task_results
                ),
            }
        }

        Ok(config)
    }

    fn from_conf_file(path: &Path) -> Result<FileConfig> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let file_config = serde_json::from_str(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        Ok(file_config)
    }

    fn apply_file(&mut self, file_config: FileConfig) {
        if let Some(host) = file_config.host {
            self.base_url = host;
        }
        if let Some(index) = file_config.index {
            self.index_name = index;
        }
        if let Some(log_task_results) = file_config.log_task_results {
            self.log_task_results = log_task_results;
        }
    }
}

/// Resolves the identity of the machine running the relay.
pub fn host_identity() -> String {
    hostname::get()
        .ok()
        .and_then(|h| h.into_string().ok())
        .filter(|h| !h.is_empty())
        .unwrap_or_else(|| "localhost".to_string())
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}

#[derive(Debug, Deserialize)]
struct FileConfig {
    host: Option<String>,
    index: Option<String>,
    log_task_results: Option<bool>,
}
