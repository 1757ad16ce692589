use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{LlmError, Result};

/// Preset used when the config file does not name one
pub const DEFAULT_PRESET: &str = "gemini-flash";

/// Model configuration: named presets and provider credentials
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Preset to use when no --model flag is provided
    #[serde(default = "default_preset")]
    pub default_preset: String,

    /// Named model presets for quick access
    #[serde(default = "default_presets")]
    pub presets: BTreeMap<String, ModelPreset>,

    /// Provider-specific configuration
    #[serde(default)]
    pub providers: BTreeMap<String, ProviderConfig>,
}

fn default_preset() -> String {
    DEFAULT_PRESET.to_string()
}

fn default_presets() -> BTreeMap<String, ModelPreset> {
    let mut presets = BTreeMap::new();
    presets.insert(
        DEFAULT_PRESET.to_string(),
        ModelPreset {
            provider: "gemini".to_string(),
            model: "gemini-2.5-flash".to_string(),
        },
    );
    presets
}

/// A named model configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelPreset {
    /// Provider identifier (gemini)
    pub provider: String,

    /// Model name/identifier for the provider
    pub model: String,
}

/// Provider-specific configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// API key (optional, can use env var instead)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Custom base URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

impl Config {
    /// Load configuration from the default location
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load configuration from a specific file, returning defaults if it doesn't exist
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    /// Save configuration to a specific file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the configuration file path: ~/.config/deep-report/models.toml
    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| LlmError::ConfigError("home directory not found".into()))?;
        Ok(home.join(".config").join("deep-report").join("models.toml"))
    }

    /// Get a preset by name
    pub fn get_preset(&self, name: &str) -> Result<&ModelPreset> {
        self.presets
            .get(name)
            .ok_or_else(|| LlmError::InvalidPreset(name.to_string()))
    }

    /// Get the preset to use, honouring an explicit name over the default
    pub fn resolve_preset(&self, name: Option<&str>) -> Result<(&str, &ModelPreset)> {
        let name = name.unwrap_or(&self.default_preset);
        let (name, preset) = self
            .presets
            .get_key_value(name)
            .ok_or_else(|| LlmError::InvalidPreset(name.to_string()))?;
        Ok((name.as_str(), preset))
    }

    /// Get provider config by provider name
    pub fn get_provider_config(&self, provider: &str) -> Option<&ProviderConfig> {
        self.providers.get(provider)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_preset: default_preset(),
            presets: default_presets(),
            providers: BTreeMap::new(),
        }
    }
}
