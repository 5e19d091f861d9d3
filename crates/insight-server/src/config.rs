//! Server configuration loading from file and environment variables.

use insight_db::DbRuntimeSettings;
use insight_interview::{LlmConfig, PromptTemplates};
use insight_voice::SpeechConfig;
use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub interview: InterviewConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub speech: SpeechConfig,
    #[serde(default)]
    pub export: ExportConfig,
    /// Overrides for individual prompt templates.
    #[serde(default)]
    pub templates: PromptTemplates,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Allowed CORS origins. Empty allows any origin.
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
    #[serde(flatten)]
    pub runtime: DbRuntimeSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "insight_server=debug,info").
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub json: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InterviewConfig {
    /// Theme used when a new interview does not name one.
    #[serde(default = "default_theme")]
    pub default_theme: String,
    /// Language for transcription and speech synthesis.
    #[serde(default = "default_language")]
    pub language: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExportConfig {
    #[serde(default = "default_export_enabled")]
    pub enabled: bool,
    #[serde(default = "default_export_dir")]
    pub dir: PathBuf,
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))
}

fn default_port() -> u16 {
    3000
}

fn default_db_path() -> String {
    "insight.db".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_theme() -> String {
    "music subscription services".to_string()
}

fn default_language() -> String {
    "en".to_string()
}

fn default_export_enabled() -> bool {
    true
}

fn default_export_dir() -> PathBuf {
    PathBuf::from("reports")
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: Vec::new(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            runtime: DbRuntimeSettings::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl Default for InterviewConfig {
    fn default() -> Self {
        Self {
            default_theme: default_theme(),
            language: default_language(),
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            enabled: default_export_enabled(),
            dir: default_export_dir(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Loads configuration from a TOML file, falling back to defaults when the
/// file does not exist, then applies environment overrides:
///
/// | Variable | Field |
/// |---|---|
/// | `INSIGHT_HOST` | `server.host` |
/// | `INSIGHT_PORT` | `server.port` |
/// | `INSIGHT_DB_PATH` | `database.path` |
/// | `INSIGHT_LOG_LEVEL` | `logging.level` |
/// | `INSIGHT_LOG_JSON` | `logging.json` ("true" or "1") |
/// | `INSIGHT_LLM_API_KEY`, else `OPENAI_API_KEY` | `llm.api_key` |
/// | `INSIGHT_LLM_BASE_URL` | `llm.base_url` |
/// | `INSIGHT_LLM_MODEL` | `llm.model` |
/// | `INSIGHT_EXPORT_DIR` | `export.dir` |
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    let config = match path {
        Some(p) => match std::fs::read_to_string(p) {
            Ok(contents) => toml::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = p, "config file not found, using defaults");
                Config::default()
            }
            Err(e) => return Err(ConfigError::FileRead(e)),
        },
        None => Config::default(),
    };

    Ok(apply_env_overrides(config, |key| std::env::var(key).ok()))
}

fn apply_env_overrides(mut config: Config, env: impl Fn(&str) -> Option<String>) -> Config {
    if let Some(parsed) = env("INSIGHT_HOST").and_then(|v| v.parse().ok()) {
        config.server.host = parsed;
    }
    if let Some(parsed) = env("INSIGHT_PORT").and_then(|v| v.parse().ok()) {
        config.server.port = parsed;
    }
    if let Some(db_path) = env("INSIGHT_DB_PATH") {
        config.database.path = db_path;
    }
    if let Some(level) = env("INSIGHT_LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Some(json) = env("INSIGHT_LOG_JSON") {
        config.logging.json = json == "true" || json == "1";
    }
    if let Some(key) = env("INSIGHT_LLM_API_KEY").or_else(|| env("OPENAI_API_KEY")) {
        if !key.trim().is_empty() {
            config.llm.api_key = key;
        }
    }
    if let Some(url) = env("INSIGHT_LLM_BASE_URL") {
        config.llm.base_url = url;
    }
    if let Some(model) = env("INSIGHT_LLM_MODEL") {
        config.llm.model = model;
    }
    if let Some(dir) = env("INSIGHT_EXPORT_DIR") {
        config.export.dir = PathBuf::from(dir);
    }
    config
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        let config = load_config(path.to_str()).unwrap();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.database.runtime, DbRuntimeSettings::default());
        assert!(config.export.enabled);
    }

    #[test]
    fn sections_parse_from_toml() {
        let config: Config = toml::from_str(
            r#"
            [server]
            port = 8088

            [database]
            path = "/var/lib/insight/insight.db"
            pool_max_size = 2

            [interview]
            default_theme = "coffee"
            language = "ja"

            [llm]
            model = "gpt-4o-mini"
            max_retries = 2

            [export]
            enabled = false

            [templates]
            closing = "Bye."
            "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 8088);
        assert_eq!(config.database.runtime.pool_max_size, 2);
        assert_eq!(config.database.runtime.busy_timeout_ms, 5_000);
        assert_eq!(config.interview.default_theme, "coffee");
        assert_eq!(config.interview.language, "ja");
        assert_eq!(config.llm.model, "gpt-4o-mini");
        assert_eq!(config.llm.max_retries, 2);
        assert!(!config.export.enabled);
        assert_eq!(config.templates.closing, "Bye.");
        assert_eq!(
            config.templates.summary,
            PromptTemplates::default().summary
        );
    }

    #[test]
    fn environment_overrides_file_values() {
        let config = apply_env_overrides(
            Config::default(),
            env_of(&[
                ("INSIGHT_PORT", "9000"),
                ("INSIGHT_HOST", "0.0.0.0"),
                ("INSIGHT_LOG_JSON", "1"),
                ("OPENAI_API_KEY", "sk-fallback"),
                ("INSIGHT_LLM_MODEL", "gpt-4o"),
                ("INSIGHT_EXPORT_DIR", "/tmp/reports"),
            ]),
        );
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host.to_string(), "0.0.0.0");
        assert!(config.logging.json);
        assert_eq!(config.llm.api_key, "sk-fallback");
        assert_eq!(config.llm.model, "gpt-4o");
        assert_eq!(config.export.dir, PathBuf::from("/tmp/reports"));
    }

    #[test]
    fn specific_llm_key_wins_and_bad_port_is_ignored() {
        let config = apply_env_overrides(
            Config::default(),
            env_of(&[
                ("INSIGHT_LLM_API_KEY", "sk-insight"),
                ("OPENAI_API_KEY", "sk-openai"),
                ("INSIGHT_PORT", "not-a-port"),
            ]),
        );
        assert_eq!(config.llm.api_key, "sk-insight");
        assert_eq!(config.server.port, 3000);
    }

    #[test]
    fn debug_output_hides_keys() {
        let mut config = Config::default();
        config.llm.api_key = "sk-very-secret".to_string();
        config.speech.api_key = "sk-speech-secret".to_string();
        let debug = format!("{:?}", config);
        assert!(!debug.contains("sk-very-secret"));
        assert!(!debug.contains("sk-speech-secret"));
    }
}
