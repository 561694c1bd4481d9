mod defaults;
mod io;
mod model_ref;
mod normalize;
mod types;
mod validation;

pub use defaults::*;
pub use io::*;
pub use model_ref::{DetailedModelRef, ModelRef, ModelRefError};
pub use normalize::normalize_config;
pub use types::*;
pub use validation::*;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::info;

/// Top-level Maestro configuration.
///
/// This is the full validated tree the framework container is built from:
/// model platforms, model capability declarations, agents, multi-agent
/// orchestrations, vector and message stores, vectorizers, and document
/// indexers. It is constructed once at bootstrap, normalized and validated
/// eagerly, and immutable afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub platform: PlatformConfig,
    /// Capability declarations: platform name → model name → capabilities.
    #[serde(default)]
    pub model: BTreeMap<String, BTreeMap<String, ModelConfig>>,
    #[serde(default)]
    pub agent: BTreeMap<String, AgentConfig>,
    #[serde(default)]
    pub multi_agent: BTreeMap<String, MultiAgentConfig>,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub message_store: MessageStoreConfig,
    #[serde(default)]
    pub vectorizer: BTreeMap<String, VectorizerConfig>,
    #[serde(default)]
    pub indexer: BTreeMap<String, IndexerConfig>,
}

impl Config {
    /// Load configuration from file, environment, and defaults, assuming no
    /// optional collaborators are installed.
    pub fn load(path: Option<&str>) -> Result<Self> {
        Self::load_with(path, &ValidationContext::default())
    }

    /// Load configuration with explicit collaborator availability.
    pub fn load_with(path: Option<&str>, ctx: &ValidationContext) -> Result<Self> {
        let config_path = path
            .map(PathBuf::from)
            .or_else(|| std::env::var("MAESTRO_CONFIG").ok().map(PathBuf::from))
            .or_else(find_config_file);

        let raw = match &config_path {
            Some(p) if p.exists() => {
                info!("Loading config from {}", p.display());
                read_config_with_includes(p, 0)?
            }
            _ => {
                info!("No config file found, using defaults");
                serde_json::json!({})
            }
        };

        let mut config = Self::from_raw(raw, ctx)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Deserialize, normalize, and validate a raw configuration value.
    ///
    /// Shape errors (missing required fields, wrong kinds, unknown enum
    /// values or keys) surface from deserialization; semantic errors come
    /// back aggregated from normalization and validation. Any error is
    /// fatal: there is no partial acceptance of an invalid configuration.
    pub fn from_raw(raw: serde_json::Value, ctx: &ValidationContext) -> Result<Self> {
        let mut config: Config =
            serde_json::from_value(raw).context("Invalid configuration structure")?;

        let normalize_errors = normalize_config(&mut config);
        if !normalize_errors.is_empty() {
            let messages: Vec<String> = normalize_errors.iter().map(|e| e.to_string()).collect();
            anyhow::bail!("Configuration normalization failed:\n{}", messages.join("\n"));
        }

        validate_config_object(&config, ctx)?;
        Ok(config)
    }

    /// Write a default configuration to a file.
    pub fn write_default(path: &str) -> Result<()> {
        let config = Config::default();
        let value = serde_json::to_value(&config)?;
        write_config_file(Path::new(path), &value)
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Provider API keys from the conventional env vars land on their
    /// platform sections, creating the section if it was absent.
    fn apply_env_overrides(&mut self) {
        if let Ok(key) = std::env::var("ANTHROPIC_API_KEY") {
            self.platform.apply_anthropic_key(&key);
        }

        if let Ok(key) = std::env::var("OPENAI_API_KEY") {
            self.platform.apply_openai_key(&key);
        }

        if let Ok(key) = std::env::var("GEMINI_API_KEY") {
            self.platform.apply_gemini_key(&key);
        }

        if let Ok(key) = std::env::var("MISTRAL_API_KEY") {
            self.platform.apply_mistral_key(&key);
        }
    }
}

impl PlatformConfig {
    pub fn apply_anthropic_key(&mut self, key: &str) {
        match &mut self.anthropic {
            Some(platform) => platform.api_key = key.to_string(),
            None => {
                self.anthropic = Some(AnthropicPlatformConfig {
                    api_key: key.to_string(),
                    version: None,
                    http_client: DEFAULT_HTTP_CLIENT.to_string(),
                });
            }
        }
    }

    pub fn apply_openai_key(&mut self, key: &str) {
        match &mut self.openai {
            Some(platform) => platform.api_key = key.to_string(),
            None => {
                self.openai = Some(OpenAiPlatformConfig {
                    api_key: key.to_string(),
                    region: None,
                    http_client: DEFAULT_HTTP_CLIENT.to_string(),
                });
            }
        }
    }

    pub fn apply_gemini_key(&mut self, key: &str) {
        apply_api_key(&mut self.gemini, key);
    }

    pub fn apply_mistral_key(&mut self, key: &str) {
        apply_api_key(&mut self.mistral, key);
    }
}

fn apply_api_key(section: &mut Option<ApiKeyPlatformConfig>, key: &str) {
    match section {
        Some(platform) => platform.api_key = key.to_string(),
        None => {
            *section = Some(ApiKeyPlatformConfig {
                api_key: key.to_string(),
                http_client: DEFAULT_HTTP_CLIENT.to_string(),
            });
        }
    }
}

/// Find the configuration file in standard locations.
fn find_config_file() -> Option<PathBuf> {
    let candidates = [
        PathBuf::from("maestro.json"),
        PathBuf::from("maestro.json5"),
        PathBuf::from("maestro.yaml"),
        PathBuf::from("maestro.yml"),
        PathBuf::from("maestro.toml"),
    ];

    for path in &candidates {
        if path.exists() {
            return Some(path.clone());
        }
    }

    if let Some(home) = dirs::home_dir() {
        let home_config = home.join(".maestro").join("config.json");
        if home_config.exists() {
            return Some(home_config);
        }
    }

    None
}
