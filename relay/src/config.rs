//! Configuration loading

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::llm::CompletionOptions;

/// Config file name looked up by [`RelayFileConfig::load`]
pub const CONFIG_FILE_NAME: &str = ".relay.toml";

/// Instructional preamble prepended when a conversation carries no system message
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a highly advanced AI assistant designed to engage in natural, human-like conversations. \
Your responses should be informative, friendly, and contextually relevant. \
Always provide accurate information and clarify any ambiguities. \
Use a tone that is respectful and engaging, and avoid overly technical jargon unless specifically requested. \
You can also handle creative tasks and provide suggestions based on user input. \
Remember to maintain user privacy and confidentiality in all interactions.";

/// Find a config file by walking up the directory tree, then checking global config.
///
/// Search order:
/// 1. Current directory and parent directories (walking up to root)
/// 2. Global config at ~/.config/chat-relay/
fn find_config_file(filename: &str) -> Option<PathBuf> {
    let mut current = std::env::current_dir().ok()?;

    loop {
        let candidate = current.join(filename);
        if candidate.exists() {
            return Some(candidate);
        }

        match current.parent() {
            Some(parent) => current = parent.to_path_buf(),
            None => break,
        }
    }

    if let Some(config_dir) = dirs::config_dir() {
        let global_path = config_dir.join("chat-relay").join(filename);
        if global_path.exists() {
            return Some(global_path);
        }
    }

    None
}

/// Top-level relay configuration (from .relay.toml)
#[derive(Debug, Default, Deserialize)]
pub struct RelayFileConfig {
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub server: ServerSectionConfig,
    #[serde(default)]
    pub knowledge: KnowledgeSectionConfig,
    #[serde(default)]
    pub cache: CacheSectionConfig,
    #[serde(default)]
    pub prompt: PromptSectionConfig,
}

/// LLM configuration section
#[derive(Debug, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_llm_url")]
    pub url: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_top_p")]
    pub top_p: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_stop_sequences")]
    pub stop: Vec<String>,
    /// Hard deadline for one completion call
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Server configuration section
#[derive(Debug, Deserialize)]
pub struct ServerSectionConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Knowledge base configuration section
#[derive(Debug, Deserialize)]
pub struct KnowledgeSectionConfig {
    /// JSON file of `{question, answer}` records; `~` and `$VAR` are expanded
    #[serde(default = "default_knowledge_path")]
    pub path: String,
}

/// Response cache configuration section
#[derive(Debug, Deserialize)]
pub struct CacheSectionConfig {
    #[serde(default = "default_cache_capacity")]
    pub capacity: usize,
}

#[derive(Debug, Default, Deserialize)]
pub struct PromptSectionConfig {
    /// Overrides [`DEFAULT_SYSTEM_PROMPT`]
    pub system: Option<String>,
}

// Default value functions
fn default_llm_url() -> String {
    "http://localhost:11434".to_string()
}

pub fn default_model() -> String {
    "deepseek-v3".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_top_p() -> f32 {
    0.9
}

fn default_max_tokens() -> u32 {
    800
}

pub fn default_stop_sequences() -> Vec<String> {
    vec!["\n\n".to_string(), "###".to_string(), "User:".to_string()]
}

fn default_timeout_secs() -> u64 {
    200
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_knowledge_path() -> String {
    "knowledge_base.json".to_string()
}

fn default_cache_capacity() -> usize {
    crate::cache::DEFAULT_CAPACITY.get()
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            url: default_llm_url(),
            model: default_model(),
            temperature: default_temperature(),
            top_p: default_top_p(),
            max_tokens: default_max_tokens(),
            stop: default_stop_sequences(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl LlmConfig {
    /// Sampling options for every completion request
    pub fn completion_options(&self) -> CompletionOptions {
        CompletionOptions {
            model: self.model.clone(),
            temperature: self.temperature,
            top_p: self.top_p,
            max_tokens: self.max_tokens,
            stop: self.stop.clone(),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ServerSectionConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for KnowledgeSectionConfig {
    fn default() -> Self {
        Self {
            path: default_knowledge_path(),
        }
    }
}

impl KnowledgeSectionConfig {
    /// Knowledge base path with `~` and environment variables expanded
    pub fn resolved_path(&self) -> Result<PathBuf> {
        let expanded = shellexpand::full(&self.path)
            .with_context(|| format!("Failed to expand knowledge base path: {}", self.path))?;
        Ok(PathBuf::from(expanded.as_ref()))
    }
}

impl Default for CacheSectionConfig {
    fn default() -> Self {
        Self {
            capacity: default_cache_capacity(),
        }
    }
}

impl RelayFileConfig {
    /// Load config from .relay.toml
    ///
    /// Search order:
    /// 1. Walk up directory tree from cwd looking for .relay.toml
    /// 2. Check ~/.config/chat-relay/.relay.toml (global fallback)
    /// 3. Fall back to defaults
    pub fn load() -> Result<Self> {
        if let Some(config_path) = find_config_file(CONFIG_FILE_NAME) {
            tracing::debug!("Loading config from: {}", config_path.display());
            return Self::load_from_path(&config_path);
        }

        tracing::debug!("No {} found, using defaults", CONFIG_FILE_NAME);
        Ok(Self::default())
    }

    /// Load from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: RelayFileConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(config)
    }

    /// System preamble, from config or the built-in default
    pub fn system_prompt(&self) -> String {
        self.prompt
            .system
            .clone()
            .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string())
    }
}
