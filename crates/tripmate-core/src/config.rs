use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Result, TripmateError};

/// Top-level configuration for TripMate.
///
/// Loaded from `~/.tripmate/config.toml` by default. API keys may also come
/// from the environment (see [`TripmateConfig::apply_env_overrides`]); the
/// resulting object is passed explicitly to every client that needs it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TripmateConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub chat: ChatConfig,
    #[serde(default)]
    pub cache: CacheConfig,
}

impl TripmateConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: TripmateConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }

    /// Overlay values from the process environment.
    ///
    /// `GEMINI_API_KEY`, `SERP_API_KEY`, `TRIPMATE_PORT` and `TRIPMATE_LOG`
    /// take precedence over the file.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Overlay values from an arbitrary lookup (the environment in
    /// production, a map in tests).
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup("GEMINI_API_KEY").filter(|v| !v.trim().is_empty()) {
            self.llm.api_key = Some(key);
        }
        if let Some(key) = lookup("SERP_API_KEY").filter(|v| !v.trim().is_empty()) {
            self.search.api_key = Some(key);
        }
        if let Some(port) = lookup("TRIPMATE_PORT").and_then(|v| v.parse::<u16>().ok()) {
            self.general.port = port;
        }
        if let Some(level) = lookup("TRIPMATE_LOG").filter(|v| !v.trim().is_empty()) {
            self.general.log_level = level;
        }
    }

    /// Check that both external services can be reached.
    ///
    /// Lists every missing key in one error so the user can fix them together.
    pub fn validate(&self) -> Result<()> {
        let mut missing = Vec::new();
        if self.llm.api_key.as_deref().map_or(true, |k| k.trim().is_empty()) {
            missing.push("GEMINI_API_KEY");
        }
        if self.search.api_key.as_deref().map_or(true, |k| k.trim().is_empty()) {
            missing.push("SERP_API_KEY");
        }
        if missing.is_empty() {
            Ok(())
        } else {
            Err(TripmateError::Config(format!(
                "missing API keys: {} (set them in the environment or the config file)",
                missing.join(", ")
            )))
        }
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
    /// HTTP server port.
    pub port: u16,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            port: 8765,
        }
    }
}

/// Language model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Gemini model name.
    pub model: String,
    /// Base URL of the models endpoint.
    pub base_url: String,
    /// API key; usually supplied through `GEMINI_API_KEY`.
    pub api_key: Option<String>,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: "gemini-1.5-pro".to_string(),
            base_url: "https://generativelanguage.googleapis.com/v1beta/models".to_string(),
            api_key: None,
            timeout_secs: 60,
        }
    }
}

/// Flight, hotel, attraction and train search settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// API key; usually supplied through `SERP_API_KEY`.
    pub api_key: Option<String>,
    /// Search endpoint.
    pub base_url: String,
    /// Upper bound on a single provider call, in seconds.
    pub timeout_secs: u64,
    pub currency: String,
    pub language: String,
    pub country: String,
    pub max_hotels: usize,
    pub max_best_flights: usize,
    pub max_other_flights: usize,
    pub max_attractions: usize,
    /// Whether to look up attractions at the destination.
    pub attractions_enabled: bool,
    /// Result pages scanned for rail hits; at most this many trains.
    pub max_trains: usize,
    /// Whether to look up rail connections.
    pub trains_enabled: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://serpapi.com/search.json".to_string(),
            timeout_secs: 30,
            currency: "USD".to_string(),
            language: "en".to_string(),
            country: "us".to_string(),
            max_hotels: 5,
            max_best_flights: 3,
            max_other_flights: 2,
            max_attractions: 8,
            attractions_enabled: true,
            max_trains: 5,
            trains_enabled: true,
        }
    }
}

/// Conversational surface settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Whether the chat engine accepts messages.
    pub enabled: bool,
    /// Maximum message length in characters.
    pub max_message_length: usize,
    /// Idle minutes after which a session is replaced by a fresh one.
    pub session_timeout_minutes: u32,
    /// Replaces the built-in reply persona when set.
    pub persona: Option<String>,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_message_length: 2000,
            session_timeout_minutes: 60,
            persona: None,
        }
    }
}

/// Search result cache settings. Zero disables the respective limit.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum entries per cache; the oldest entry is evicted beyond this.
    pub max_entries: usize,
    /// Age in seconds after which an entry is treated as absent.
    pub max_age_secs: u64,
}
