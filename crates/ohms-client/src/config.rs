//! Client configuration and factory.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use ohms_core::cutoffs::LetterCutoffs;
use ohms_core::homework::DEFAULT_PARALLELISM;

use crate::http::{HomeworkClient, DEFAULT_TIMEOUT_SECS};

/// Environment variable that overrides `base_url`.
pub const BASE_URL_ENV: &str = "OHMS_BASE_URL";

/// Top-level ohms configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OhmsConfig {
    /// Root of the homework server; endpoints are resolved against it.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// Max question loads in flight when opening a homework page.
    #[serde(default = "default_parallelism")]
    pub parallelism: usize,
    #[serde(default)]
    pub grading: GradingConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GradingConfig {
    /// Twelve thresholds, A+ down to D-.
    #[serde(default)]
    pub cutoffs: LetterCutoffs,
}

fn default_base_url() -> String {
    "http://localhost:8080".to_string()
}
fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}
fn default_parallelism() -> usize {
    DEFAULT_PARALLELISM
}

impl Default for OhmsConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout(),
            parallelism: default_parallelism(),
            grading: GradingConfig::default(),
        }
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
fn resolve_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    while let Some(start) = result.find("${") {
        let Some(end) = result[start..].find('}') else {
            break;
        };
        let var_name = &result[start + 2..start + end];
        let value = std::env::var(var_name).unwrap_or_default();
        result = format!("{}{}{}", &result[..start], value, &result[start + end + 1..]);
    }
    result
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `ohms.toml` in the current directory
/// 2. `~/.config/ohms/config.toml`
///
/// `OHMS_BASE_URL` overrides the base URL wherever it came from.
pub fn load_config() -> Result<OhmsConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<OhmsConfig> {
    let config_path = match path {
        Some(p) if p.exists() => Some(p.to_path_buf()),
        Some(p) => anyhow::bail!("config file not found: {}", p.display()),
        None => {
            let local = PathBuf::from("ohms.toml");
            if local.exists() {
                Some(local)
            } else {
                dirs_path()
                    .map(|dir| dir.join("config.toml"))
                    .filter(|global| global.exists())
            }
        }
    };

    let mut config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            tracing::debug!("using config {}", path.display());
            toml::from_str::<OhmsConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => OhmsConfig::default(),
    };

    if let Ok(url) = std::env::var(BASE_URL_ENV) {
        config.base_url = url;
    }
    config.base_url = resolve_env_vars(&config.base_url);
    anyhow::ensure!(
        !config.base_url.trim().is_empty(),
        "base_url is empty; set it in the config or via {BASE_URL_ENV}"
    );
    anyhow::ensure!(config.timeout_secs > 0, "timeout_secs must be positive");

    Ok(config)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("ohms"))
}

/// Build the HTTP client a configuration describes.
pub fn create_client(config: &OhmsConfig) -> Result<HomeworkClient> {
    HomeworkClient::new(&config.base_url, config.timeout_secs)
        .with_context(|| format!("failed to create client for {}", config.base_url))
}
