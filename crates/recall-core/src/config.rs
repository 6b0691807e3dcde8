use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{RecallError, Result};

/// Top-level configuration for the Recall assistant.
///
/// Loaded from `~/.recall/config.toml` by default. Every section falls back
/// to its defaults when omitted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecallConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub chat: ChatConfig,
}

impl RecallConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: RecallConfig = toml::from_str(&content)?;
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
        let content =
            toml::to_string_pretty(self).map_err(|e| RecallError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Data directory for the memory database.
    pub data_dir: String,
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            data_dir: "~/.recall/data".to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl GeneralConfig {
    /// The data directory with a leading `~` expanded to the home directory.
    pub fn data_path(&self) -> PathBuf {
        expand_home(&self.data_dir)
    }
}

/// Which key-value backend holds the persisted chat memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    Sqlite,
    Memory,
}

/// Persistence configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Database file name, relative to `general.data_dir`.
    pub database_file: String,
    /// Key under which the serialized memory is stored.
    pub memory_key: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Sqlite,
            database_file: "memory.db".to_string(),
            memory_key: "recall_chat_memory".to_string(),
        }
    }
}

/// Conversation engine tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Maximum persisted conversation turns (oldest evicted first).
    pub history_limit: usize,
    /// Maximum persisted sentiment samples (oldest evicted first).
    pub sentiment_limit: usize,
    /// Number of recent turns forwarded to the response service.
    pub context_turns: usize,
    /// Number of follow-up questions returned per reply.
    pub follow_up_count: usize,
    /// Number of actionable insights returned per reply.
    pub insight_count: usize,
    /// Confidence used when the response service omits one.
    pub default_confidence: f32,
    /// Maximum message length in characters.
    pub max_message_length: usize,
    #[serde(default)]
    pub thresholds: StateThresholds,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            history_limit: 10,
            sentiment_limit: 10,
            context_turns: 5,
            follow_up_count: 2,
            insight_count: 3,
            default_confidence: 0.85,
            max_message_length: 4000,
            thresholds: StateThresholds::default(),
        }
    }
}

/// History-length thresholds driving the conversation state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StateThresholds {
    /// Troubleshooting and search help move to clarifying at this many prior turns.
    pub clarify_after: usize,
    /// Content creation resolves once history exceeds this.
    pub resolve_after: usize,
    /// Other intents complete once history exceeds this.
    pub complete_after: usize,
}

impl Default for StateThresholds {
    fn default() -> Self {
        Self {
            clarify_after: 2,
            resolve_after: 3,
            complete_after: 5,
        }
    }
}

/// Expand `~/` to the user's home directory.
pub fn expand_home(path: &str) -> PathBuf {
    if path.starts_with("~/") || path.starts_with("~\\") {
        #[cfg(target_os = "windows")]
        let home = std::env::var("USERPROFILE").unwrap_or_else(|_| ".".to_string());
        #[cfg(not(target_os = "windows"))]
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        PathBuf::from(home).join(&path[2..])
    } else {
        PathBuf::from(path)
    }
}
