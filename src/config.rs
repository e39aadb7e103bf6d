use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RoamConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub extraction: ExtractionConfig,
    pub conversation: ConversationConfig,
    pub search: SearchConfig,
    pub towns: TownsConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub log_level: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StorageConfig {
    pub db_path: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Base URL of an OpenAI-compatible API (without `/chat/completions`).
    pub endpoint: String,
    pub model: String,
    /// Read from the environment only; never from the config file.
    #[serde(skip)]
    pub api_key: Option<String>,
    pub temperature: f32,
    pub max_tokens: u32,
    /// How many recent conversation turns are sent along with each request.
    pub history_turns: usize,
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ConversationConfig {
    pub require_confirmation: bool,
    pub max_history: usize,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SearchConfig {
    pub default_limit: usize,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct TownsConfig {
    /// IANA zone used when a town is known but not in the towns table.
    pub default_timezone: String,
}

impl Default for RoamConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            storage: StorageConfig::default(),
            extraction: ExtractionConfig::default(),
            conversation: ConversationConfig::default(),
            search: SearchConfig::default(),
            towns: TownsConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 8787,
            log_level: "info".into(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        let db_path = default_roam_dir()
            .join("events.db")
            .to_string_lossy()
            .into_owned();
        Self { db_path }
    }
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com/v1".into(),
            model: "gpt-4o-mini".into(),
            api_key: None,
            temperature: 0.0,
            max_tokens: 1500,
            history_turns: 8,
            timeout_secs: 60,
        }
    }
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            require_confirmation: true,
            max_history: 20,
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self { default_limit: 10 }
    }
}

impl Default for TownsConfig {
    fn default() -> Self {
        Self {
            default_timezone: "America/Santo_Domingo".into(),
        }
    }
}

/// Returns `~/.roam/`
pub fn default_roam_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".roam")
}

/// Returns the default config file path: `~/.roam/config.toml`
pub fn default_config_path() -> PathBuf {
    default_roam_dir().join("config.toml")
}

impl RoamConfig {
    /// Load config from TOML file (if it exists) then apply env var overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(default_config_path())
    }

    /// Load from a specific path, then apply env var overrides.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let contents =
                std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str(&contents).context("failed to parse config TOML")?
        } else {
            info!("no config file at {}, using defaults", path.display());
            RoamConfig::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides (ROAM_DB, ROAM_LOG_LEVEL, ROAM_HOST,
    /// ROAM_PORT, ROAM_LLM_ENDPOINT, ROAM_LLM_MODEL, ROAM_LLM_API_KEY / OPENAI_API_KEY).
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("ROAM_DB") {
            self.storage.db_path = val;
        }
        if let Ok(val) = std::env::var("ROAM_LOG_LEVEL") {
            self.server.log_level = val;
        }
        if let Ok(val) = std::env::var("ROAM_HOST") {
            self.server.host = val;
        }
        if let Some(port) = std::env::var("ROAM_PORT")
            .ok()
            .and_then(|v| v.parse::<u16>().ok())
        {
            self.server.port = port;
        }
        if let Ok(val) = std::env::var("ROAM_LLM_ENDPOINT") {
            self.extraction.endpoint = val;
        }
        if let Ok(val) = std::env::var("ROAM_LLM_MODEL") {
            self.extraction.model = val;
        }
        self.extraction.api_key = std::env::var("ROAM_LLM_API_KEY")
            .or_else(|_| std::env::var("OPENAI_API_KEY"))
            .ok()
            .filter(|key| !key.trim().is_empty());
    }

    /// Resolve the database path, expanding `~` if needed.
    pub fn resolved_db_path(&self) -> PathBuf {
        expand_tilde(&self.storage.db_path)
    }

    /// `host:port` for the HTTP listener.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

pub fn expand_tilde(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}
