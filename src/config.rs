//! Application configuration.
//!
//! Configuration is loaded from a TOML file at:
//! 1. `$MAILSLEUTH_CONFIG` (environment variable)
//! 2. `~/.config/mailsleuth/config.toml` (Linux/macOS)
//!    `%APPDATA%\mailsleuth\config.toml` (Windows)
//! 3. Built-in defaults

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General behavior settings.
    pub general: GeneralConfig,
    /// Graph analysis and context assembly tuning.
    pub analysis: AnalysisConfig,
    /// Model backend (Ollama) settings.
    pub model: ModelConfig,
}

/// General behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: "error", "warn", "info", "debug", "trace".
    pub log_level: String,
    /// Override cache directory for log files.
    pub cache_dir: Option<PathBuf>,
}

/// Graph analysis and context assembly tuning.
///
/// Both thresholds were empirically chosen in field use; they are
/// configuration, not constants of the method.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// A node is flagged anomalous when its degree exceeds
    /// `mean + anomaly_k * stddev` over the corpus.
    pub anomaly_k: f64,
    /// Maximum size, in characters, of the text context handed to the
    /// model backend per request.
    pub context_budget: usize,
    /// Number of connector nodes shown in summaries.
    pub top_connectors: usize,
}

/// Model backend settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Base URL of the Ollama server.
    pub base_url: String,
    /// Model name passed to `/api/chat`.
    pub model: String,
    /// Request timeout in seconds. There is no implicit retry.
    pub timeout_secs: u64,
}

// ── Default implementations ─────────────────────────────────────

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
            cache_dir: None,
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            anomaly_k: 2.0,
            context_budget: 24_000,
            top_connectors: 10,
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            model: "mistral".to_string(),
            timeout_secs: 120,
        }
    }
}

// ── Load / save ─────────────────────────────────────────────────

/// Load configuration, searching standard locations.
///
/// Returns the default configuration if no file is found or on parse error.
pub fn load_config() -> Config {
    if let Some(path) = config_file_path() {
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(contents) => match toml::from_str::<Config>(&contents) {
                    Ok(cfg) => {
                        tracing::info!(path = %path.display(), "Loaded config");
                        return cfg;
                    }
                    Err(e) => {
                        tracing::warn!(
                            path = %path.display(),
                            error = %e,
                            "Failed to parse config, using defaults"
                        );
                    }
                },
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "Failed to read config file, using defaults"
                    );
                }
            }
        }
    }
    Config::default()
}

/// Determine the config file path (checking env var first, then standard dirs).
pub fn config_file_path() -> Option<PathBuf> {
    if let Ok(env_path) = std::env::var("MAILSLEUTH_CONFIG") {
        return Some(PathBuf::from(env_path));
    }
    dirs::config_dir().map(|d| d.join("mailsleuth").join("config.toml"))
}

/// Return the cache directory for log files.
pub fn cache_dir(config: &Config) -> PathBuf {
    if let Some(ref dir) = config.general.cache_dir {
        return dir.clone();
    }
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("mailsleuth")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let cfg = Config::default();
        assert_eq!(cfg.general.log_level, "warn");
        assert_eq!(cfg.analysis.anomaly_k, 2.0);
        assert_eq!(cfg.analysis.context_budget, 24_000);
        assert_eq!(cfg.model.model, "mistral");
        assert_eq!(cfg.model.timeout_secs, 120);
    }

    #[test]
    fn test_serialize_deserialize_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).expect("serialize");
        let parsed: Config = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.general.log_level, cfg.general.log_level);
        assert_eq!(parsed.analysis.anomaly_k, cfg.analysis.anomaly_k);
        assert_eq!(parsed.model.base_url, cfg.model.base_url);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let partial = r#"
[analysis]
anomaly_k = 3.5

[model]
model = "llama3"
"#;
        let cfg: Config = toml::from_str(partial).expect("parse partial");
        assert_eq!(cfg.analysis.anomaly_k, 3.5);
        assert_eq!(cfg.model.model, "llama3");
        // Other fields use defaults
        assert_eq!(cfg.analysis.context_budget, 24_000);
        assert_eq!(cfg.general.log_level, "warn");
    }
}
