use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tt_engine::{AttributionConfig, InferenceConfig};

/// Resolve the data directory based on priority:
/// 1. TT_PATH environment variable (with tilde expansion)
/// 2. Platform data directory (recommended default)
/// 3. ~/.tt (fallback for systems without a standard data directory)
pub fn resolve_data_dir() -> Result<PathBuf> {
    if let Ok(env_path) = std::env::var("TT_PATH") {
        return Ok(expand_tilde(&env_path));
    }

    if let Some(data_dir) = dirs::data_dir() {
        return Ok(data_dir.join("tt"));
    }

    if let Some(home) = std::env::var_os("HOME") {
        return Ok(PathBuf::from(home).join(".tt"));
    }

    anyhow::bail!("Could not determine data directory: no HOME or platform data directory found")
}

/// Default database location inside the data directory.
pub fn default_db_path() -> Result<PathBuf> {
    Ok(resolve_data_dir()?.join("events.db"))
}

/// Expand tilde (~) in paths to the user's home directory
fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/")
        && let Some(home) = std::env::var_os("HOME")
    {
        return PathBuf::from(home).join(stripped);
    }
    PathBuf::from(path)
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub attribution: AttributionSection,
    #[serde(default)]
    pub inference: InferenceSection,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AttributionSection {
    pub attention_window_ms: Option<i64>,
    pub session_timeout_ms: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct InferenceSection {
    pub gap_threshold_ms: Option<i64>,
}

impl Config {
    /// Load `config.toml` from the directory holding the database. A missing
    /// file means defaults; a malformed one is an error.
    pub fn load_for_db(db_path: &Path) -> Result<Self> {
        let Some(dir) = db_path.parent() else {
            return Ok(Self::default());
        };
        let config_path = dir.join("config.toml");
        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read {}", config_path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", config_path.display()))?;
        Ok(config)
    }

    pub fn attribution(&self) -> AttributionConfig {
        let defaults = AttributionConfig::default();
        AttributionConfig {
            attention_window_ms: self
                .attribution
                .attention_window_ms
                .unwrap_or(defaults.attention_window_ms),
            session_timeout_ms: self
                .attribution
                .session_timeout_ms
                .unwrap_or(defaults.session_timeout_ms),
        }
    }

    pub fn inference(&self) -> InferenceConfig {
        let defaults = InferenceConfig::default();
        InferenceConfig {
            gap_threshold_ms: self
                .inference
                .gap_threshold_ms
                .unwrap_or(defaults.gap_threshold_ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_config_gives_defaults() {
        let config = Config::load_for_db(Path::new("/nonexistent/events.db")).unwrap();
        assert_eq!(config.attribution().attention_window_ms, 120_000);
        assert_eq!(config.attribution().session_timeout_ms, 1_800_000);
        assert_eq!(config.inference().gap_threshold_ms, 1_800_000);
    }

    #[test]
    fn test_partial_config_overrides() {
        let parsed: Config = toml::from_str(
            r#"
            [attribution]
            attention_window_ms = 60000
            "#,
        )
        .unwrap();
        assert_eq!(parsed.attribution().attention_window_ms, 60_000);
        assert_eq!(parsed.attribution().session_timeout_ms, 1_800_000);
    }
}
