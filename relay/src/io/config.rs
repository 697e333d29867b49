//! Assistant configuration, read from `~/.config/relay/config.toml`.
//!
//! The file is written by hand and entirely optional: a missing file or a
//! missing field falls back to defaults. Only the delegate entry point has no
//! usable default, and that is validated at invocation time rather than here
//! so chat-only usage works without any configuration.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    pub chat: ChatConfig,
    pub delegate: DelegateConfig,
}

/// Generation parameters for the chat-completion service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Model identifier sent with every completion request.
    pub model: String,
    /// Upper bound on generated tokens per reply.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f32,
    /// Base URL of the OpenAI-compatible API.
    pub api_base: String,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o".to_string(),
            max_tokens: 150,
            temperature: 0.7,
            api_base: "https://api.openai.com/v1".to_string(),
        }
    }
}

/// How the delegate process is launched and bounded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DelegateConfig {
    /// Agent entry point; must exist on disk when a task is delegated.
    pub path: PathBuf,
    /// Command that launches the entry point, which is appended as the final
    /// argument. Empty means the entry point is executed directly.
    pub launcher: Vec<String>,
    /// Wall-clock budget for one delegation.
    pub timeout_secs: u64,
    /// Captured stdout/stderr are truncated beyond this many bytes per stream.
    pub output_limit_bytes: usize,
}

impl Default for DelegateConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::new(),
            launcher: vec!["python3".to_string()],
            timeout_secs: 60,
            output_limit_bytes: 1_000_000,
        }
    }
}

impl DelegateConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl RelayConfig {
    pub fn validate(&self) -> Result<()> {
        if self.chat.model.trim().is_empty() {
            return Err(anyhow!("chat.model must not be empty"));
        }
        if self.chat.max_tokens == 0 {
            return Err(anyhow!("chat.max_tokens must be greater than zero"));
        }
        if !(0.0..=2.0).contains(&self.chat.temperature) {
            return Err(anyhow!("chat.temperature must be within 0.0..=2.0"));
        }
        if self.delegate.timeout_secs == 0 {
            return Err(anyhow!("delegate.timeout_secs must be greater than zero"));
        }
        if self.delegate.output_limit_bytes == 0 {
            return Err(anyhow!("delegate.output_limit_bytes must be greater than zero"));
        }
        Ok(())
    }
}

/// Resolve the default config path (`$HOME/.config/relay/config.toml`).
pub fn default_config_path() -> Option<PathBuf> {
    std::env::var_os("HOME").map(|home| {
        PathBuf::from(home)
            .join(".config")
            .join("relay")
            .join("config.toml")
    })
}

/// Load configuration from a TOML file; a missing file yields defaults.
pub fn load_config(path: &Path) -> Result<RelayConfig> {
    if !path.exists() {
        debug!(path = %path.display(), "no config file, using defaults");
        let config = RelayConfig::default();
        config.validate()?;
        return Ok(config);
    }
    let contents =
        fs::read_to_string(path).with_context(|| format!("read config {}", path.display()))?;
    let config: RelayConfig =
        toml::from_str(&contents).with_context(|| format!("parse config {}", path.display()))?;
    config.validate()?;
    debug!(path = %path.display(), "loaded config");
    Ok(config)
}
