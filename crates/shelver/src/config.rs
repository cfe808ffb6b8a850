//! TOML configuration parsing and validation.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use shelver_core::semantic::SEMANTIC_MATCH_THRESHOLD;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    #[serde(default)]
    pub matcher: MatcherConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

/// Semantic matcher client settings.
///
/// `provider = "disabled"` runs every audit heuristic-only; `"http"`
/// requires `endpoint` and calls the external matcher service.
#[derive(Debug, Deserialize, Clone)]
pub struct MatcherConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Minimum score below which the matcher reports no primary match.
    #[serde(default = "default_min_score")]
    pub min_score: f64,
    /// Upper bound on one matcher call; on expiry the audit degrades
    /// to heuristic-only scoring.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            endpoint: None,
            min_score: default_min_score(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_provider() -> String {
    "disabled".to_string()
}
fn default_min_score() -> f64 {
    SEMANTIC_MATCH_THRESHOLD
}
fn default_timeout_secs() -> u64 {
    10
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub bind: String,
}

impl MatcherConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != "disabled"
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    match config.matcher.provider.as_str() {
        "disabled" | "http" => {}
        other => anyhow::bail!(
            "Unknown matcher provider: '{}'. Must be disabled or http.",
            other
        ),
    }

    if config.matcher.is_enabled() && config.matcher.endpoint.is_none() {
        anyhow::bail!(
            "matcher.endpoint must be set when provider is '{}'",
            config.matcher.provider
        );
    }

    if !(0.0..=1.0).contains(&config.matcher.min_score) {
        anyhow::bail!("matcher.min_score must be in [0.0, 1.0]");
    }

    if config.matcher.timeout_secs == 0 {
        anyhow::bail!("matcher.timeout_secs must be > 0");
    }

    Ok(config)
}
